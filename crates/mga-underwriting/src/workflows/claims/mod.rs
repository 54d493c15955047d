//! Claim intake and status handling gated by the claim workflow table.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{ClaimId, ClaimStatus, ClaimTransitionRequest, OpenClaimRequest, StatusChange};
pub use repository::{ClaimRecord, ClaimRepository, ClaimView};
pub use router::claim_router;
pub use service::{ClaimService, ClaimServiceError};
