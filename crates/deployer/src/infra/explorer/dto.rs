use serde::Deserialize;

/// Envelope of every Etherscan API response.
#[derive(Debug, Deserialize)]
pub struct Response {
    pub status: String,
    pub message: String,
    pub result: String,
}

/// Outcome of a `verifysourcecode` request.
#[derive(Debug, Eq, PartialEq)]
pub enum Submission {
    /// Queued for verification under the given GUID.
    Queued(String),
    AlreadyVerified,
    Failed(String),
}

/// Outcome of a `checkverifystatus` request.
#[derive(Debug, Eq, PartialEq)]
pub enum Status {
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

impl Response {
    fn ok(&self) -> bool {
        self.status == "1"
    }

    fn already_verified(&self) -> bool {
        self.result.to_lowercase().contains("already verified")
    }

    fn error(self) -> String {
        format!("{}: {}", self.message, self.result)
    }

    pub fn into_submission(self) -> Submission {
        if self.ok() {
            Submission::Queued(self.result)
        } else if self.already_verified() {
            Submission::AlreadyVerified
        } else {
            Submission::Failed(self.error())
        }
    }

    pub fn into_status(self) -> Status {
        if self.ok() {
            Status::Verified
        } else if self.result.to_lowercase().starts_with("pending") {
            Status::Pending
        } else if self.already_verified() {
            Status::AlreadyVerified
        } else {
            Status::Failed(self.error())
        }
    }
}
