/// Failures raised by DOM, range and selection operations.
///
/// The variants mirror the DOM exception names so callers can map them back
/// to host errors one to one.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("IndexSizeError: index or size is negative or greater than the allowed amount")]
    IndexSize,
    #[error("InvalidNodeTypeError: node is of a type that is not allowed here")]
    InvalidNodeType,
    #[error("HierarchyRequestError: node cannot be inserted at this point in the hierarchy")]
    HierarchyRequest,
    #[error("WrongDocumentError: node belongs to a different document or tree")]
    WrongDocument,
    #[error("NoModificationAllowedError: node is read-only")]
    NoModificationAllowed,
    #[error("InvalidStateError: {0}")]
    InvalidState(String),
    #[error("NotFoundError: node was not found where it was expected")]
    NotFound,
    #[error("UnsupportedEnvironmentError: {0}")]
    UnsupportedEnvironment(String),
    #[error("range is not valid: {0}")]
    InvalidRange(String),
    #[error(transparent)]
    Parse(#[from] html::ParseError),
}

impl DomError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        DomError::InvalidState(msg.into())
    }
}

pub type DomResult<T> = Result<T, DomError>;
