use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ftp_watcher_core::contract::{Credentials, MockTransferClient, TransferClient, TransferError};
use ftp_watcher_core::provision::{ProvisionOutcome, RemotePathProvisioner};
use futures::future::join_all;
use mockall::Sequence;

#[tokio::test]
async fn chain_is_created_from_host_root_downward() {
    let mut client = MockTransferClient::new();
    let mut seq = Sequence::new();

    client
        .expect_list_directory()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err("550 No such file or directory".into()));
    client
        .expect_make_directory()
        .withf(|url, _| url == "ftp://host/a/b/c/")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err("550 Parent missing".into()));
    for expected in ["ftp://host/a/", "ftp://host/a/b/", "ftp://host/a/b/c/"] {
        client
            .expect_make_directory()
            .withf(move |url, _| url == expected)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
    }

    let creds = Credentials::new("user", "pw");
    let outcome = RemotePathProvisioner::new(&client, &creds)
        .ensure_directory_exists("ftp://host/a/b/c/")
        .await;

    assert_eq!(
        outcome,
        ProvisionOutcome::WalkedChain {
            attempted: 3,
            created: 3
        }
    );
}

#[tokio::test]
async fn failing_segments_do_not_stop_the_walk() {
    let mut client = MockTransferClient::new();
    client
        .expect_list_directory()
        .returning(|_, _| Err("550".into()));
    let mut calls = 0;
    client
        .expect_make_directory()
        .times(4)
        .returning(move |url, _| {
            calls += 1;
            // leaf create, then "a" already exists, then b and c succeed
            if calls == 1 || url == "ftp://host/a/" {
                Err("550 exists".into())
            } else {
                Ok(())
            }
        });

    let creds = Credentials::new("user", "pw");
    let outcome = RemotePathProvisioner::new(&client, &creds)
        .ensure_directory_exists("ftp://host/a/b/c/")
        .await;

    assert_eq!(
        outcome,
        ProvisionOutcome::WalkedChain {
            attempted: 3,
            created: 2
        }
    );
}

/// In-memory server that only knows directories it was told to create,
/// and rejects creates whose parent is missing or that already exist.
struct DirectoryTree {
    dirs: Mutex<Vec<String>>,
    creates: Mutex<Vec<String>>,
}

impl DirectoryTree {
    fn with_root(root: &str) -> Self {
        Self {
            dirs: Mutex::new(vec![root.to_owned()]),
            creates: Mutex::new(Vec::new()),
        }
    }
}

fn parent_of(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..=idx].to_owned(),
        None => String::new(),
    }
}

#[async_trait]
impl TransferClient for DirectoryTree {
    async fn upload(&self, _: &str, _: &Credentials, _: Vec<u8>) -> Result<(), TransferError> {
        Ok(())
    }

    async fn list_directory(&self, url: &str, _: &Credentials) -> Result<(), TransferError> {
        if self.dirs.lock().unwrap().iter().any(|d| d == url) {
            Ok(())
        } else {
            Err(format!("550 {url}: no such directory").into())
        }
    }

    async fn make_directory(&self, url: &str, _: &Credentials) -> Result<(), TransferError> {
        tokio::task::yield_now().await;
        self.creates.lock().unwrap().push(url.to_owned());
        let mut dirs = self.dirs.lock().unwrap();
        if dirs.iter().any(|d| d == url) {
            return Err(format!("550 {url}: file exists").into());
        }
        if !dirs.contains(&parent_of(url)) {
            return Err(format!("550 {url}: parent missing").into());
        }
        dirs.push(url.to_owned());
        Ok(())
    }
}

#[tokio::test]
async fn only_host_root_exists_creates_each_ancestor_in_order() {
    let tree = DirectoryTree::with_root("ftp://host/");
    let creds = Credentials::new("user", "pw");

    RemotePathProvisioner::new(&tree, &creds)
        .ensure_directory_exists("ftp://host/a/b/c/")
        .await;

    assert_eq!(
        *tree.creates.lock().unwrap(),
        vec![
            "ftp://host/a/b/c/",
            "ftp://host/a/",
            "ftp://host/a/b/",
            "ftp://host/a/b/c/"
        ]
    );
    assert!(tree.list_directory("ftp://host/a/b/c/", &creds).await.is_ok());
}

#[tokio::test]
async fn concurrent_provisioning_of_same_path_converges() {
    let tree = Arc::new(DirectoryTree::with_root("ftp://host/"));
    let creds = Credentials::new("user", "pw");

    let jobs = (0..4).map(|_| {
        let tree = Arc::clone(&tree);
        let creds = creds.clone();
        async move {
            RemotePathProvisioner::new(tree.as_ref(), &creds)
                .ensure_directory_exists("ftp://host/2024/3/7/")
                .await
        }
    });
    join_all(jobs).await;

    for dir in ["ftp://host/2024/", "ftp://host/2024/3/", "ftp://host/2024/3/7/"] {
        assert!(
            tree.list_directory(dir, &creds).await.is_ok(),
            "{dir} should exist"
        );
    }
}
