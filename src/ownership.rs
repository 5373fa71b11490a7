use uuid::Uuid;

use crate::error::ApiError;

/// Ownership guard: every update/delete of an owned entity goes through
/// here before the mutation is issued. Callers resolve a missing entity to
/// `NotFound` before calling this.
pub fn ensure_owner(owner: Uuid, actor: Uuid, what: &str) -> Result<(), ApiError> {
    if owner == actor {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "you are not allowed to modify this {}",
            what
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn owner_passes() {
        let id = Uuid::new_v4();
        assert!(ensure_owner(id, id, "video").is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let err = ensure_owner(Uuid::new_v4(), Uuid::new_v4(), "tweet").unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
        assert!(err.to_string().contains("tweet"));
    }
}
