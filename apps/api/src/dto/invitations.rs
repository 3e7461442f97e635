mod conversions;
mod types;

pub use types::{
    AcceptInvitationRequest, InvitationResponse, IssuedInvitationResponse, SendInvitationRequest,
};
