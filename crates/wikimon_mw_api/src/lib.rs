pub mod client;
pub mod error;
pub mod siteinfo;

pub use client::{ClientConnector, MediaWikiClient, ReqwestConnector, ReqwestMwClient};
pub use error::MwApiError;
pub use siteinfo::{SiteInfo, SiteInfoProp};
