use bifrost_core::{BifrostError, BifrostResult, Provider};

/// Slot owning an adapter's live client.
///
/// Present means connected. Releasing drops the client; releasing an empty
/// slot does nothing.
#[derive(Debug)]
pub(crate) struct Connection<C> {
    provider: Provider,
    client: Option<C>,
}

impl<C> Connection<C> {
    pub(crate) fn new(provider: Provider, client: C) -> Self {
        Self {
            provider,
            client: Some(client),
        }
    }

    pub(crate) fn client(&self) -> BifrostResult<&C> {
        self.client.as_ref().ok_or_else(|| {
            BifrostError::client(format!("no active {} client", self.provider.name()))
        })
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Drop the client. Returns whether one was present.
    pub(crate) fn release(&mut self) -> bool {
        self.client.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bifrost_core::ErrorCode;

    #[test]
    fn release_is_idempotent() {
        let mut conn = Connection::new(Provider::PinataCloud, "client");
        assert!(conn.is_connected());
        assert_eq!(*conn.client().unwrap(), "client");

        assert!(conn.release());
        assert!(!conn.is_connected());
        assert!(!conn.release());
    }

    #[test]
    fn released_slot_reports_client_error() {
        let mut conn = Connection::new(Provider::GoogleCloudStorage, 1u8);
        conn.release();

        let err = conn.client().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ClientError);
        assert_eq!(err.message(), "no active Google Cloud Storage client");
    }
}
