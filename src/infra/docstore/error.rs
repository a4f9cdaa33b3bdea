use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};

use crate::application::repos::RepoError;

const DUPLICATE_KEY: i32 = 11000;

/// Translate a driver error into the repository taxonomy.
pub fn map_mongo_error(err: MongoError) -> RepoError {
    let classified = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            Some(RepoError::Duplicate {
                constraint: duplicate_index(&write.message),
            })
        }
        ErrorKind::ServerSelection { .. } => Some(RepoError::Timeout),
        ErrorKind::BsonDeserialization(inner) => Some(RepoError::integrity(inner.to_string())),
        _ => None,
    };
    classified.unwrap_or_else(|| RepoError::from_persistence(err))
}

/// Pull the index name out of an `E11000 ... index: <name> dup key` message.
fn duplicate_index(message: &str) -> String {
    message
        .split_once("index: ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_index_name_is_extracted() {
        let message = "E11000 duplicate key error collection: db.entries.blog \
                       index: slug_unique dup key: { slug: \"a-title\" }";
        assert_eq!(duplicate_index(message), "slug_unique");
        assert_eq!(duplicate_index("something else"), "unknown");
    }
}
