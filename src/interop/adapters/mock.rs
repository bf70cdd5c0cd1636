//! Mock adapters for testing
//!
//! Allows setting expected results per view address and recording every
//! local invocation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::traits::{FetchError, LedgerClient, ViewClient};
use crate::interop::types::{Credentials, LocalInvocation, View};

/// Mock view client
///
/// Unless configured otherwise, every address yields a view whose payload is
/// `payload:<address>`.
pub struct MockViewClient {
    name: String,
    /// Map of address -> expected result
    results: Mutex<HashMap<String, Result<View, FetchError>>>,
    /// Map of address -> artificial latency
    delays: Mutex<HashMap<String, Duration>>,
    fetches: AtomicUsize,
}

impl MockViewClient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            results: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_payload(&self, address: &str, payload: &[u8]) {
        let view = View::new(address, b"mock-proof".to_vec(), payload.to_vec());
        self.results.lock().unwrap().insert(address.to_string(), Ok(view));
    }

    pub fn set_error(&self, address: &str, error: FetchError) {
        self.results.lock().unwrap().insert(address.to_string(), Err(error));
    }

    pub fn set_delay(&self, address: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(address.to_string(), delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn get_result(&self, address: &str) -> Result<View, FetchError> {
        self.results
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_else(|| {
                Ok(View::new(
                    address,
                    b"mock-proof".to_vec(),
                    format!("payload:{}", address).into_bytes(),
                ))
            })
    }
}

#[async_trait]
impl ViewClient for MockViewClient {
    async fn fetch(
        &self,
        address: &str,
        sign_required: bool,
        credentials: &Credentials,
    ) -> Result<View, FetchError> {
        log::debug!(
            "[{}] fetch({}, sign={}, user={})",
            self.name, address, sign_required, credentials.user
        );
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(address).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.get_result(address)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Mock local ledger
pub struct MockLedger {
    name: String,
    result: Mutex<Result<String, String>>,
    delay: Mutex<Option<Duration>>,
    invocations: Mutex<Vec<LocalInvocation>>,
}

impl MockLedger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            result: Mutex::new(Ok("OK".to_string())),
            delay: Mutex::new(None),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn set_result(&self, result: Result<String, String>) {
        *self.result.lock().unwrap() = result;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn invoke_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn invocations(&self) -> Vec<LocalInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn invoke(
        &self,
        invocation: &LocalInvocation,
        credentials: &Credentials,
    ) -> anyhow::Result<String> {
        log::debug!(
            "[{}] invoke({}, args={}, user={})",
            self.name,
            invocation.function,
            invocation.args.len(),
            credentials.user
        );

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.invocations.lock().unwrap().push(invocation.clone());
        let result = self.result.lock().unwrap().clone();
        result.map_err(|e| anyhow::anyhow!(e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
