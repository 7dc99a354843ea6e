use tracing::debug;

use crate::contract::{Credentials, FileCreatedEvent, TransferClient, TransferError};

/// Remote URL of `event`'s file under `destination_root`.
pub fn destination_url(destination_root: &str, event: &FileCreatedEvent) -> String {
    format!("{destination_root}{}", event.file_name)
}

/// One transfer attempt: read the whole file and hand it to the client.
///
/// Read errors and transport errors come back the same way; the caller
/// treats every error as a reason to retry.
pub async fn upload_once<C>(
    client: &C,
    credentials: &Credentials,
    destination_root: &str,
    event: &FileCreatedEvent,
) -> Result<(), TransferError>
where
    C: TransferClient + ?Sized,
{
    let url = destination_url(destination_root, event);
    let content = tokio::fs::read(event.full_path()).await?;
    debug!(url = %url, bytes = content.len(), "Uploading file");
    client.upload(&url, credentials, content).await
}
