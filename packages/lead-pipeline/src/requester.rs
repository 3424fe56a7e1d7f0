use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::traits::ScrapeRequester;
use crate::types::ContextHandle;

/// Forwards "scroll for more ads" requests to whoever drives the scraper.
#[derive(Debug, Clone)]
pub struct ChannelRequester {
    sender: mpsc::UnboundedSender<ContextHandle>,
}

impl ChannelRequester {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ContextHandle>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ScrapeRequester for ChannelRequester {
    async fn request_more_input(&self, context: &ContextHandle) -> anyhow::Result<()> {
        self.sender
            .send(context.clone())
            .map_err(|_| anyhow::anyhow!("scraper for context {} is gone", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_reaches_receiver() {
        let (requester, mut rx) = ChannelRequester::new();
        requester
            .request_more_input(&ContextHandle::from("tab-9"))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().as_str(), "tab-9");
    }

    #[tokio::test]
    async fn test_closed_receiver_is_an_error() {
        let (requester, rx) = ChannelRequester::new();
        drop(rx);

        assert!(requester
            .request_more_input(&ContextHandle::from("tab-9"))
            .await
            .is_err());
    }
}
