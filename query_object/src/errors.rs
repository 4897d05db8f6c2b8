use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryObjectError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("Engine state poisoned: {0}")]
    Poisoned(String),
}

impl From<bson::ser::Error> for QueryObjectError {
    fn from(err: bson::ser::Error) -> Self {
        QueryObjectError::Serialization(err.to_string())
    }
}
