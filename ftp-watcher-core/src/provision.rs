//! Remote directory provisioning.
//!
//! An upload that fails because its destination directory is missing is
//! repaired here: check the directory, try to create it directly, and if the
//! parent is missing too, walk the whole chain from the host root downward.
//! Every create in the chain walk is best effort; "already exists" and real
//! failures look the same and are both ignored, so concurrent jobs racing
//! to create the same directory are harmless.

use tracing::{debug, info, warn};

use crate::contract::{Credentials, TransferClient};
use crate::destination::RemoteUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The listing succeeded; nothing was created.
    AlreadyPresent,
    /// The leaf directory was created in one request.
    CreatedLeaf,
    /// The leaf create failed and every ancestor was attempted in order.
    WalkedChain { attempted: usize, created: usize },
    /// The path could not be decomposed, so no chain walk was possible.
    Unparseable,
}

pub struct RemotePathProvisioner<'a, C: ?Sized> {
    client: &'a C,
    credentials: &'a Credentials,
}

impl<'a, C> RemotePathProvisioner<'a, C>
where
    C: TransferClient + ?Sized,
{
    pub fn new(client: &'a C, credentials: &'a Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// True if listing the directory succeeds; false on any failure.
    pub async fn directory_exists(&self, url: &str) -> bool {
        match self.client.list_directory(url, self.credentials).await {
            Ok(()) => true,
            Err(e) => {
                debug!(url, error = %e, "Remote directory listing failed");
                false
            }
        }
    }

    pub async fn ensure_directory_exists(&self, url: &str) -> ProvisionOutcome {
        if self.directory_exists(url).await {
            return ProvisionOutcome::AlreadyPresent;
        }

        match self.client.make_directory(url, self.credentials).await {
            Ok(()) => {
                info!(url, "Created remote directory");
                ProvisionOutcome::CreatedLeaf
            }
            Err(e) => {
                debug!(url, error = %e, "Direct create failed, creating every subpath");
                self.create_all_subpaths(url).await
            }
        }
    }

    async fn create_all_subpaths(&self, url: &str) -> ProvisionOutcome {
        let Some(remote) = RemoteUrl::parse(url) else {
            warn!(url, "Cannot decompose remote path; skipping directory creation");
            return ProvisionOutcome::Unparseable;
        };

        let chain = remote.ancestor_chain();
        let mut created = 0;
        for dir in &chain {
            match self.client.make_directory(dir, self.credentials).await {
                Ok(()) => created += 1,
                Err(e) => debug!(url = %dir, error = %e, "Subpath create failed (ignored)"),
            }
        }
        info!(
            url,
            attempted = chain.len(),
            created,
            "Walked remote directory chain"
        );
        ProvisionOutcome::WalkedChain {
            attempted: chain.len(),
            created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockTransferClient;

    fn creds() -> Credentials {
        Credentials::new("user", "pw")
    }

    #[tokio::test]
    async fn existing_directory_is_left_alone() {
        let mut client = MockTransferClient::new();
        client
            .expect_list_directory()
            .times(1)
            .returning(|_, _| Ok(()));
        client.expect_make_directory().never();

        let creds = creds();
        let outcome = RemotePathProvisioner::new(&client, &creds)
            .ensure_directory_exists("ftp://host/a/")
            .await;
        assert_eq!(outcome, ProvisionOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn leaf_is_created_directly_when_parent_exists() {
        let mut client = MockTransferClient::new();
        client
            .expect_list_directory()
            .returning(|_, _| Err("550 not found".into()));
        client
            .expect_make_directory()
            .withf(|url, _| url == "ftp://host/a/b/")
            .times(1)
            .returning(|_, _| Ok(()));

        let creds = creds();
        let outcome = RemotePathProvisioner::new(&client, &creds)
            .ensure_directory_exists("ftp://host/a/b/")
            .await;
        assert_eq!(outcome, ProvisionOutcome::CreatedLeaf);
    }

    #[tokio::test]
    async fn unparseable_path_stops_after_direct_create() {
        let mut client = MockTransferClient::new();
        client
            .expect_list_directory()
            .returning(|_, _| Err("refused".into()));
        client
            .expect_make_directory()
            .times(1)
            .returning(|_, _| Err("refused".into()));

        let creds = creds();
        let outcome = RemotePathProvisioner::new(&client, &creds)
            .ensure_directory_exists("")
            .await;
        assert_eq!(outcome, ProvisionOutcome::Unparseable);
    }
}
