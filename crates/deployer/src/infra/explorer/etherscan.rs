use {
    super::{Error, Request, Verified, Verifier, dto},
    reqwest::header,
    std::time::Duration,
    url::{Url, form_urlencoded},
};

/// Verifier for Etherscan and API compatible explorers.
#[derive(Clone, Debug)]
pub struct Etherscan {
    client: reqwest::Client,
    poll_interval: Duration,
    max_polls: usize,
}

impl Etherscan {
    const DEFAULT_MAX_POLLS: usize = 30;
    const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_polls: Self::DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = poll_interval;
        self.max_polls = max_polls;
        self
    }

    async fn submit(&self, request: &Request) -> Result<dto::Submission, Error> {
        let source = request.contract.source.as_ref().ok_or_else(|| {
            Error::Unavailable(format!(
                "no compiler input found for {}",
                request.contract.name
            ))
        })?;
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("apikey", &request.api_key)
            .append_pair("module", "contract")
            .append_pair("action", "verifysourcecode")
            .append_pair("contractaddress", &request.address.to_string())
            .append_pair("sourceCode", &source.standard_json_input.to_string())
            .append_pair("codeformat", "solidity-standard-json-input")
            .append_pair("contractname", &source.fully_qualified_name)
            .append_pair("compilerversion", &format!("v{}", source.compiler_version))
            // Misspelled on purpose, this is the parameter name the API expects.
            .append_pair(
                "constructorArguements",
                &alloy::hex::encode(&request.contract.encoded_args),
            )
            .finish();

        let response = self
            .client
            .post(request.explorer.api_url.clone())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .json::<dto::Response>()
            .await?;
        Ok(response.into_submission())
    }

    async fn status(&self, request: &Request, guid: &str) -> Result<dto::Status, Error> {
        let mut url: Url = request.explorer.api_url.clone();
        url.query_pairs_mut()
            .append_pair("apikey", &request.api_key)
            .append_pair("module", "contract")
            .append_pair("action", "checkverifystatus")
            .append_pair("guid", guid);

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<dto::Response>()
            .await?;
        Ok(response.into_status())
    }
}

#[async_trait::async_trait]
impl Verifier for Etherscan {
    async fn verify_source(&self, request: &Request) -> Result<Verified, Error> {
        let guid = match self.submit(request).await? {
            dto::Submission::Queued(guid) => guid,
            dto::Submission::AlreadyVerified => return Ok(Verified::Already),
            dto::Submission::Failed(reason) => return Err(Error::Failed(reason)),
        };
        tracing::debug!(%guid, "source submitted for verification");

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            match self.status(request, &guid).await? {
                dto::Status::Pending => continue,
                dto::Status::Verified => return Ok(Verified::Now),
                dto::Status::AlreadyVerified => return Ok(Verified::Already),
                dto::Status::Failed(reason) => return Err(Error::Failed(reason)),
            }
        }
        Err(Error::Timeout)
    }
}
