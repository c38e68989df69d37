//! Request/response channel to the flight controller's arming service.

use crate::warn;
use async_trait::async_trait;
use std::time::Duration;
use strum_macros::Display;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmResponse {
    pub success: bool,
    pub message: String,
}

impl ArmResponse {
    pub fn accepted() -> Self { Self { success: true, message: String::new() } }

    pub fn rejected(message: &str) -> Self { Self { success: false, message: message.to_string() } }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ArmingError {
    Timeout,
    ServiceUnavailable,
    NoResponse,
}

impl std::error::Error for ArmingError {}

/// Arms or disarms the vehicle's motors.
#[async_trait]
pub trait ArmingService: Send + Sync {
    /// Sends one arm (`true`) or disarm (`false`) request and waits for the verdict.
    ///
    /// An `Ok` response may still carry `success == false` if the service refused.
    async fn request_arm(&self, arm: bool) -> Result<ArmResponse, ArmingError>;
}

/// A pending arm request as seen by the service side.
#[derive(Debug)]
pub struct ArmRequest {
    arm: bool,
    reply: oneshot::Sender<ArmResponse>,
}

impl ArmRequest {
    pub fn arm(&self) -> bool { self.arm }

    pub fn respond(self, response: ArmResponse) {
        if self.reply.send(response).is_err() {
            warn!("Arm requester went away before the response was sent");
        }
    }
}

/// Creates a connected client/server pair. Each client call is bounded by `timeout`.
pub fn channel(timeout: Duration) -> (ArmingClient, ArmingServer) {
    let (tx, rx) = mpsc::channel(10);
    (ArmingClient { tx, timeout }, ArmingServer { rx })
}

#[derive(Debug, Clone)]
pub struct ArmingClient {
    tx: mpsc::Sender<ArmRequest>,
    timeout: Duration,
}

#[async_trait]
impl ArmingService for ArmingClient {
    async fn request_arm(&self, arm: bool) -> Result<ArmResponse, ArmingError> {
        let (reply, response) = oneshot::channel();
        let exchange = async {
            self.tx
                .send(ArmRequest { arm, reply })
                .await
                .map_err(|_| ArmingError::ServiceUnavailable)?;
            response.await.map_err(|_| ArmingError::NoResponse)
        };
        tokio::time::timeout(self.timeout, exchange).await.map_err(|_| ArmingError::Timeout)?
    }
}

#[derive(Debug)]
pub struct ArmingServer {
    rx: mpsc::Receiver<ArmRequest>,
}

impl ArmingServer {
    /// Next pending request, `None` once every client is dropped.
    pub async fn next_request(&mut self) -> Option<ArmRequest> { self.rx.recv().await }
}
