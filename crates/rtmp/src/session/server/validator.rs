//! Stream validation.

use rill_amf0::Amf0Value;

use crate::command_messages::netconnection::NetConnectionCommandConnect;

/// Validates the commands of a publishing client before the session acts on
/// them.
///
/// Every method defaults to accepting. A rejection closes the connection and
/// surfaces as
/// [`ServerSessionError::ValidationRejected`](super::ServerSessionError::ValidationRejected).
///
/// Validators are read-only from the session's point of view.
pub trait Validator {
    /// Validate the connect command.
    fn validate_connect(&self, connect: &NetConnectionCommandConnect<'_>) -> Result<(), String> {
        let _ = connect;
        Ok(())
    }

    /// Validate the releaseStream command.
    fn validate_release_stream(&self, stream_key: &str) -> Result<(), String> {
        let _ = stream_key;
        Ok(())
    }

    /// Validate the publish command.
    fn validate_publish(&self, app: &str, stream_key: &str) -> Result<(), String> {
        let _ = (app, stream_key);
        Ok(())
    }

    /// Validate a @setDataFrame data message.
    ///
    /// `values` holds everything following the `@setDataFrame` name,
    /// usually `["onMetaData", {..}]`.
    fn validate_set_data_frame(&self, values: &[Amf0Value<'_>]) -> Result<(), String> {
        let _ = values;
        Ok(())
    }

    /// Validate an onMetaData data message.
    fn validate_on_meta_data(&self, values: &[Amf0Value<'_>]) -> Result<(), String> {
        let _ = values;
        Ok(())
    }
}

/// The default validator: accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Validator for AcceptAll {}
