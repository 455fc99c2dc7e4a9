//! Tests for the batch processing engine.

use super::*;
use crate::error::{AdapterError, MoveToFailedError};
use crate::message::Order;
use crate::processor::PaymentProcessor;
use crate::registry::ProviderId;
use crate::response::Relocation;
use async_trait::async_trait;
use mockall::mock;
use payflow_queue::QueueError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================================
// Mocks
// ============================================================================

mock! {
    pub Adapter {}

    #[async_trait]
    impl MessageAdapter for Adapter {
        async fn fetch_messages(&self) -> Result<Vec<PaymentMessage>, AdapterError>;
        async fn delete(&self, id: &MessageHandle) -> Result<(), AdapterError>;
        async fn move_to_failed(&self, message: &PaymentMessage) -> Result<(), MoveToFailedError>;
    }
}

mock! {
    pub Processor {}

    #[async_trait]
    impl PaymentProcessor for Processor {
        async fn process(&self, message: &PaymentMessage) -> Result<(), ProcessingError>;
    }
}

fn message(id: &str, provider: &str) -> PaymentMessage {
    PaymentMessage::new(
        MessageHandle::new(id).unwrap(),
        provider,
        Order {
            id: format!("order-{}", id),
            ..Default::default()
        },
    )
}

fn registry_with<P: PaymentProcessor + 'static>(processor: P) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(ProviderId::new("Example").unwrap(), Arc::new(processor));
    Arc::new(registry)
}

fn adapter_fetching(batch: Vec<PaymentMessage>) -> MockAdapter {
    let mut adapter = MockAdapter::new();
    adapter
        .expect_fetch_messages()
        .times(1)
        .returning(move || Ok(batch.clone()));
    adapter
}

fn queue_error() -> QueueError {
    QueueError::ConnectionFailed {
        message: "connection reset".to_string(),
    }
}

fn engine(registry: Arc<ProviderRegistry>, adapter: MockAdapter) -> BatchProcessor {
    BatchProcessor::new(registry, Arc::new(adapter))
}

// ============================================================================
// Batch-level behavior
// ============================================================================

mod batch {
    use super::*;

    /// Verify that an empty fetch short-circuits without dispatching.
    #[tokio::test]
    async fn test_empty_fetch() {
        let mut processor = MockProcessor::new();
        processor.expect_process().never();

        let mut adapter = adapter_fetching(vec![]);
        adapter.expect_delete().never();

        let response = engine(registry_with(processor), adapter)
            .process_batch()
            .await
            .unwrap();

        assert_eq!(response, BatchResponse::empty());
        assert_eq!(response.result, "No messages received");
        assert!(response.messages.is_empty());
    }

    /// Verify that a fetch failure returns the fixed error and dispatches nothing.
    #[tokio::test]
    async fn test_fetch_failure() {
        let mut processor = MockProcessor::new();
        processor.expect_process().never();

        let mut adapter = MockAdapter::new();
        adapter
            .expect_fetch_messages()
            .times(1)
            .returning(|| Err(AdapterError::Receive(queue_error())));
        adapter.expect_delete().never();
        adapter.expect_move_to_failed().never();

        let err = engine(registry_with(processor), adapter)
            .process_batch()
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::FetchFailed(AdapterError::Receive(_))));
        assert_eq!(err.to_string(), "failed to read messages from SQS");
    }

    /// Verify that a mixed batch yields one response per message.
    #[tokio::test]
    async fn test_one_response_per_message() {
        let mut processor = MockProcessor::new();
        processor.expect_process().times(4).returning(|m| {
            match m.id.as_str() {
                "declined" => Err(ProcessingError::retryable("declined")),
                "broken" => Err(ProcessingError::critical("provider down")),
                _ => Ok(()),
            }
        });

        let mut adapter = adapter_fetching(vec![
            message("ok-1", "Example"),
            message("declined", "Example"),
            message("broken", "Example"),
            message("ok-2", "Example"),
            message("unknown", "Nobody"),
        ]);
        adapter.expect_delete().times(2).returning(|_| Ok(()));
        adapter
            .expect_move_to_failed()
            .times(1)
            .returning(|_| Ok(()));

        let response = engine(registry_with(processor), adapter)
            .process_batch()
            .await
            .unwrap();

        assert_eq!(response.result, "Messages processed");
        assert_eq!(response.messages.len(), 5);
        assert_eq!(response.count(MessageStatus::Success), 2);
        assert_eq!(response.count(MessageStatus::Error), 2);
        assert_eq!(response.count(MessageStatus::Critical), 1);

        let ids: Vec<_> = response.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["ok-1", "declined", "broken", "ok-2", "unknown"]);
    }

    /// Verify that a batch where every message fails still completes.
    #[tokio::test]
    async fn test_all_failures_still_processed() {
        let mut processor = MockProcessor::new();
        processor
            .expect_process()
            .times(3)
            .returning(|_| Err(ProcessingError::retryable("declined")));

        let mut adapter = adapter_fetching(vec![
            message("a", "Example"),
            message("b", "Example"),
            message("c", "Example"),
        ]);
        adapter.expect_delete().never();

        let response = engine(registry_with(processor), adapter)
            .process_batch()
            .await
            .unwrap();

        assert_eq!(response.result, "Messages processed");
        assert_eq!(response.count(MessageStatus::Error), 3);
    }
}

// ============================================================================
// Per-message resolution
// ============================================================================

mod resolution {
    use super::*;

    async fn resolve_one(
        processor: MockProcessor,
        adapter: MockAdapter,
        msg: PaymentMessage,
    ) -> MessageResponse {
        engine(registry_with(processor), adapter)
            .resolve_message(msg)
            .await
    }

    /// Verify that success deletes the message.
    #[tokio::test]
    async fn test_success_deletes() {
        let mut processor = MockProcessor::new();
        processor.expect_process().times(1).returning(|_| Ok(()));

        let mut adapter = MockAdapter::new();
        adapter
            .expect_delete()
            .withf(|id| id.as_str() == "r-1")
            .times(1)
            .returning(|_| Ok(()));
        adapter.expect_move_to_failed().never();

        let response = resolve_one(processor, adapter, message("r-1", "Example")).await;
        assert_eq!(
            response,
            MessageResponse::success(MessageHandle::new("r-1").unwrap())
        );
    }

    /// Verify that an unknown provider is reported without touching the queue.
    #[tokio::test]
    async fn test_unknown_provider() {
        let mut processor = MockProcessor::new();
        processor.expect_process().never();

        let mut adapter = MockAdapter::new();
        adapter.expect_delete().never();
        adapter.expect_move_to_failed().never();

        let response = resolve_one(processor, adapter, message("r-1", "Acme")).await;
        assert_eq!(response.status, MessageStatus::Error);
        assert_eq!(
            response.error.as_deref(),
            Some("provider Acme not available to process this message")
        );
    }

    /// Verify that a retryable failure is wrapped and leaves the message alone.
    #[tokio::test]
    async fn test_retryable_failure() {
        let mut processor = MockProcessor::new();
        processor
            .expect_process()
            .times(1)
            .returning(|_| Err(ProcessingError::retryable("fail to process the payment")));

        let mut adapter = MockAdapter::new();
        adapter.expect_delete().never();
        adapter.expect_move_to_failed().never();

        let response = resolve_one(processor, adapter, message("r-1", "Example")).await;
        assert_eq!(response.status, MessageStatus::Error);
        assert_eq!(
            response.error.as_deref(),
            Some("failed to process the payment: fail to process the payment")
        );
        assert!(response.relocation.is_none());
    }

    /// Verify that a critical failure moves the message exactly once.
    #[tokio::test]
    async fn test_critical_failure_moved() {
        let mut processor = MockProcessor::new();
        processor
            .expect_process()
            .times(1)
            .returning(|_| Err(ProcessingError::critical("provider internal error")));

        let mut adapter = MockAdapter::new();
        adapter.expect_delete().never();
        adapter
            .expect_move_to_failed()
            .withf(|m| m.id.as_str() == "r-1" && m.order.id == "order-r-1")
            .times(1)
            .returning(|_| Ok(()));

        let response = resolve_one(processor, adapter, message("r-1", "Example")).await;
        assert_eq!(response.status, MessageStatus::Critical);
        assert_eq!(response.error.as_deref(), Some("provider internal error"));
    }

    /// Verify that a failed send to the failed store degrades to an error.
    #[tokio::test]
    async fn test_critical_move_not_sent() {
        let mut processor = MockProcessor::new();
        processor
            .expect_process()
            .times(1)
            .returning(|_| Err(ProcessingError::critical("provider internal error")));

        let mut adapter = MockAdapter::new();
        adapter.expect_delete().never();
        adapter
            .expect_move_to_failed()
            .times(1)
            .returning(|_| Err(MoveToFailedError::Send(queue_error())));

        let response = resolve_one(processor, adapter, message("r-1", "Example")).await;
        assert_eq!(response.status, MessageStatus::Error);
        assert_eq!(
            response.error.as_deref(),
            Some("problem to move the message to DLQ: provider internal error")
        );
        assert_eq!(response.relocation, Some(Relocation::NotMoved));
    }

    /// Verify that a copied but undeleted message is reported as duplicated.
    #[tokio::test]
    async fn test_critical_move_duplicated() {
        let mut processor = MockProcessor::new();
        processor
            .expect_process()
            .times(1)
            .returning(|_| Err(ProcessingError::critical("provider internal error")));

        let mut adapter = MockAdapter::new();
        adapter
            .expect_move_to_failed()
            .times(1)
            .returning(|_| Err(MoveToFailedError::RemoveFromSource(queue_error())));

        let response = resolve_one(processor, adapter, message("r-1", "Example")).await;
        assert_eq!(response.status, MessageStatus::Error);
        assert_eq!(response.relocation, Some(Relocation::Duplicated));
    }

    /// Verify that a delete failure after success is reported as an error.
    #[tokio::test]
    async fn test_delete_failure_after_success() {
        let mut processor = MockProcessor::new();
        processor.expect_process().times(1).returning(|_| Ok(()));

        let mut adapter = MockAdapter::new();
        adapter
            .expect_delete()
            .times(1)
            .returning(|_| Err(AdapterError::Delete(queue_error())));

        let response = resolve_one(processor, adapter, message("r-1", "Example")).await;
        assert_eq!(response.status, MessageStatus::Error);
        assert_eq!(
            response.error.as_deref(),
            Some("failed to delete messages from SQS: Connection failed: connection reset")
        );
    }

    /// Verify that resolving the same message twice gives the same outcome.
    #[tokio::test]
    async fn test_resolution_is_repeatable() {
        let mut processor = MockProcessor::new();
        processor
            .expect_process()
            .times(2)
            .returning(|_| Err(ProcessingError::critical("provider internal error")));

        let mut adapter = MockAdapter::new();
        adapter
            .expect_move_to_failed()
            .times(2)
            .returning(|_| Err(MoveToFailedError::Send(queue_error())));

        let engine = engine(registry_with(processor), adapter);
        let first = engine.resolve_message(message("r-1", "Example")).await;
        let second = engine.resolve_message(message("r-1", "Example")).await;
        assert_eq!(first, second);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;
    use tokio::sync::Barrier;

    /// Processor that only returns once `parties` messages are in flight
    struct BarrierProcessor {
        barrier: Barrier,
    }

    #[async_trait]
    impl PaymentProcessor for BarrierProcessor {
        async fn process(&self, _message: &PaymentMessage) -> Result<(), ProcessingError> {
            self.barrier.wait().await;
            Ok(())
        }
    }

    /// Processor with a per-message delay that counts completions
    struct SlowProcessor {
        completed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PaymentProcessor for SlowProcessor {
        async fn process(&self, message: &PaymentMessage) -> Result<(), ProcessingError> {
            // Later messages finish first
            let delay = match message.id.as_str() {
                "a" => 60,
                "b" => 30,
                _ => 5,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Panics for one specific message
    struct PanickingProcessor;

    #[async_trait]
    impl PaymentProcessor for PanickingProcessor {
        async fn process(&self, message: &PaymentMessage) -> Result<(), ProcessingError> {
            if message.id.as_str() == "bad" {
                panic!("boom");
            }
            Ok(())
        }
    }

    /// Verify that messages of a batch are processed concurrently.
    #[tokio::test]
    async fn test_messages_dispatched_concurrently() {
        let processor = BarrierProcessor {
            barrier: Barrier::new(3),
        };
        let mut adapter = adapter_fetching(vec![
            message("a", "Example"),
            message("b", "Example"),
            message("c", "Example"),
        ]);
        adapter.expect_delete().times(3).returning(|_| Ok(()));

        // Sequential dispatch would never get past the barrier
        let response = tokio::time::timeout(
            Duration::from_secs(5),
            engine(registry_with(processor), adapter).process_batch(),
        )
        .await
        .expect("batch should not deadlock")
        .unwrap();

        assert_eq!(response.count(MessageStatus::Success), 3);
    }

    /// Verify that the batch waits for every task regardless of completion order.
    #[tokio::test]
    async fn test_batch_waits_for_all_tasks() {
        let completed = Arc::new(AtomicUsize::new(0));
        let processor = SlowProcessor {
            completed: Arc::clone(&completed),
        };
        let mut adapter = adapter_fetching(vec![
            message("a", "Example"),
            message("b", "Example"),
            message("c", "Example"),
        ]);
        adapter.expect_delete().times(3).returning(|_| Ok(()));

        let response = engine(registry_with(processor), adapter)
            .process_batch()
            .await
            .unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 3);
        assert_eq!(response.messages.len(), 3);
        assert_eq!(response.messages[0].id.as_str(), "a");
    }

    /// Verify that a panicking task becomes an error response for its message.
    #[tokio::test]
    async fn test_panicking_task_reported() {
        let mut adapter = adapter_fetching(vec![
            message("good", "Example"),
            message("bad", "Example"),
        ]);
        adapter
            .expect_delete()
            .withf(|id| id.as_str() == "good")
            .times(1)
            .returning(|_| Ok(()));

        let response = engine(registry_with(PanickingProcessor), adapter)
            .process_batch()
            .await
            .unwrap();

        assert_eq!(response.messages.len(), 2);
        let bad = response.find("bad").unwrap();
        assert_eq!(bad.status, MessageStatus::Error);
        assert_eq!(
            bad.error.as_deref(),
            Some("message processing task failed: boom")
        );
        assert_eq!(
            response.find("good").map(|m| m.status),
            Some(MessageStatus::Success)
        );
    }
}
