use thiserror::Error;

/// Errors re-raised by controller mutations.
///
/// Fetch failures are swallowed into state (plus a notification); only
/// create/update/delete propagate, so the originating form can stay open.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] trackdeck_api::Error),
}
