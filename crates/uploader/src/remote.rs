//! Remote write seam: what the driver needs from a Git host.
//!
//! A trait keeps the driver decoupled from transport and testable with
//! recording mocks. The GitHub client implements it directly.

use std::future::Future;
use std::pin::Pin;

use gitfolder_github::{Client, CreateRepository, Error, PutContents};

/// Abstract write surface of the remote Git host.
pub trait RemoteRepository: Send + Sync {
    /// Creates the target repository for the authenticated account.
    fn create_repository(
        &self,
        req: &CreateRepository,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + '_>>;

    /// Writes one base64-encoded file to a repository path.
    fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        req: &PutContents,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + '_>>;
}

impl RemoteRepository for Client {
    fn create_repository(
        &self,
        req: &CreateRepository,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + '_>> {
        let req = req.clone();
        Box::pin(async move { Client::create_repository(self, &req).await.map(|_| ()) })
    }

    fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        req: &PutContents,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + '_>> {
        let owner = owner.to_string();
        let repo = repo.to_string();
        let path = path.to_string();
        let req = req.clone();
        Box::pin(async move { Client::put_contents(self, &owner, &repo, &path, &req).await })
    }
}
