pub mod link;

pub use link::{
    CreateLinkRequest, LinkScope, NewTrackingClick, NewTrackingLink, TrackingClick, TrackingLink,
    UpdateLinkRequest,
};
