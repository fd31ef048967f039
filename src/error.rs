use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout requested while another layout or transition is in flight")]
    LayoutInProgress,

    #[error("node {node} belongs to domain {domain}, which has no computed cell")]
    MissingDomainCell { node: String, domain: String },

    #[error("unknown domain: {0}")]
    UnknownDomain(String),
}
