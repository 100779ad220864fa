use serde::Serialize;

/// One occurrence of the search literal in a specific repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MatchRow {
    pub organization: String,
    pub repository: String,
    pub branch: String,
    pub file_path: String,
    pub line_number: u64,
    pub link: String,
}

impl MatchRow {
    pub fn new(
        host: &str,
        organization: &str,
        repository: &str,
        branch: &str,
        file_path: &str,
        line_number: u64,
    ) -> Self {
        Self {
            organization: organization.to_string(),
            repository: repository.to_string(),
            branch: branch.to_string(),
            file_path: file_path.to_string(),
            line_number,
            link: blob_link(host, organization, repository, branch, file_path, line_number),
        }
    }
}

/// `https://<host>/<org>/<repo>/blob/<branch>/<path>#L<line>`
pub fn blob_link(
    host: &str,
    organization: &str,
    repository: &str,
    branch: &str,
    file_path: &str,
    line_number: u64,
) -> String {
    format!("https://{host}/{organization}/{repository}/blob/{branch}/{file_path}#L{line_number}")
}
