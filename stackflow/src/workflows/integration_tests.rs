//! End-to-end scenarios for the composed workflows.

#[cfg(test)]
mod tests {
    use crate::config::ProjectConfig;
    use crate::context::{shared, Context, ServiceWorkflow};
    use crate::core::{StackPhase, StackType};
    use crate::events::CollectingEventSink;
    use crate::testing::{
        assert_all_before, assert_called_in_order, database_stack, service_stack, stack,
        FakeStackManager, StackCall,
    };
    use crate::workflows::{
        new_environment_terminator, new_service_undeployer, service_input, TeardownTier,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn context(fake: &Arc<FakeStackManager>) -> (Context, Arc<CollectingEventSink>) {
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = Context::new(ProjectConfig::new(), fake.clone()).with_events(sink.clone());
        (ctx, sink)
    }

    fn populated_environment(fake: &FakeStackManager) {
        fake.add_stack(StackType::Service, service_stack("svc-a", "dev", "a"));
        fake.add_stack(StackType::Service, service_stack("svc-b", "dev", "b"));
        fake.add_stack(StackType::Service, service_stack("svc-c", "prod", "c"));
        fake.add_stack(StackType::Database, database_stack("db-a", "dev", "a"));
        for stack_type in [
            StackType::ServiceDiscovery,
            StackType::Cluster,
            StackType::LoadBalancer,
            StackType::Network,
            StackType::Target,
        ] {
            fake.add_stack(
                stack_type,
                stack(format!("stackflow-{}-dev", stack_type.slug()), "CREATE_COMPLETE"),
            );
        }
    }

    #[tokio::test]
    async fn test_only_environment_services_are_deleted() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        let (ctx, sink) = context(&fake);

        new_environment_terminator(&ctx, "dev").execute().await.unwrap();

        let deleted = fake.deleted();
        assert!(deleted.contains(&"svc-a".to_string()));
        assert!(deleted.contains(&"svc-b".to_string()));
        assert!(!deleted.contains(&"svc-c".to_string()));
        assert!(fake.contains("svc-c"));

        assert_called_in_order(
            &fake.calls(),
            &[
                StackCall::Delete("svc-a".into()),
                StackCall::Delete("svc-b".into()),
                StackCall::Await("svc-a".into()),
                StackCall::Await("svc-b".into()),
                StackCall::List(StackType::Database),
            ],
        );
        assert!(sink.messages().contains(
            &"   Undeploying service 'a' from environment 'dev'".to_string()
        ));
    }

    #[tokio::test]
    async fn test_batched_tiers_submit_before_awaiting() {
        let fake = Arc::new(FakeStackManager::new().with_await_latency(Duration::from_millis(5)));
        populated_environment(&fake);
        fake.add_stack(StackType::Service, service_stack("svc-d", "dev", "d"));
        let (ctx, _) = context(&fake);

        new_environment_terminator(&ctx, "dev").execute().await.unwrap();

        let calls = fake.calls();
        let database_listing = calls
            .iter()
            .position(|c| *c == StackCall::List(StackType::Database))
            .unwrap();
        let (service_tier, _) = calls.split_at(database_listing);
        assert_all_before(service_tier, StackCall::is_delete, StackCall::is_await);
        assert_eq!(
            service_tier.iter().filter(|c| StackCall::is_delete(c)).count(),
            3
        );
    }

    #[tokio::test]
    async fn test_tiers_run_in_dependency_order() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        let (ctx, sink) = context(&fake);

        new_environment_terminator(&ctx, "dev").execute().await.unwrap();

        assert_called_in_order(
            &fake.calls(),
            &[
                StackCall::List(StackType::Service),
                StackCall::List(StackType::Database),
                StackCall::Delete("db-a".into()),
                StackCall::Await("db-a".into()),
                StackCall::Delete("stackflow-consul-dev".into()),
                StackCall::Delete("stackflow-cluster-dev".into()),
                StackCall::Delete("stackflow-loadbalancer-dev".into()),
                StackCall::Delete("stackflow-vpc-dev".into()),
                StackCall::Await("stackflow-vpc-dev".into()),
                StackCall::Delete("stackflow-target-dev".into()),
                StackCall::Await("stackflow-target-dev".into()),
            ],
        );
        assert_eq!(
            sink.events_of_type("teardown.tier.started").len(),
            TeardownTier::ORDER.len()
        );
        assert!(!fake.contains("stackflow-vpc-dev"));
    }

    #[tokio::test]
    async fn test_network_submission_failures_are_ignored() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        fake.fail_delete("stackflow-vpc-dev");
        fake.fail_delete("stackflow-target-dev");
        let (ctx, sink) = context(&fake);

        new_environment_terminator(&ctx, "dev").execute().await.unwrap();

        assert_eq!(
            fake.calls_for("stackflow-vpc-dev"),
            vec![
                StackCall::Delete("stackflow-vpc-dev".into()),
                StackCall::Await("stackflow-vpc-dev".into()),
            ]
        );
        assert_eq!(sink.events_of_type("stack.delete.ignored").len(), 2);
        assert_eq!(sink.events_of_type("pipeline.completed").len(), 1);
    }

    #[tokio::test]
    async fn test_network_terminal_failure_is_still_fatal() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        fake.set_final_status("stackflow-vpc-dev", "DELETE_FAILED", "dependency violation");
        let (ctx, _) = context(&fake);

        let err = new_environment_terminator(&ctx, "dev")
            .execute()
            .await
            .unwrap_err();

        assert!(err.is_terminal_failure());
        assert!(fake.calls_for("stackflow-target-dev").is_empty());
    }

    #[tokio::test]
    async fn test_service_submission_failure_aborts_before_databases() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        fake.fail_delete("svc-b");
        let (ctx, _) = context(&fake);

        let err = new_environment_terminator(&ctx, "dev")
            .execute()
            .await
            .unwrap_err();

        assert!(err.is_submission());
        assert!(!fake.calls().contains(&StackCall::List(StackType::Database)));
        assert!(!fake.calls().iter().any(|c| StackCall::is_await(c)));
    }

    #[tokio::test]
    async fn test_unnameable_environment_makes_no_calls() {
        let fake = Arc::new(FakeStackManager::new());
        fake.add_stack(StackType::Service, service_stack("svc-a", "dev_1", "a"));
        let (ctx, _) = context(&fake);

        let err = new_environment_terminator(&ctx, "dev_1")
            .execute()
            .await
            .unwrap_err();

        assert!(err.is_input());
        assert!(fake.calls().is_empty());
        assert!(fake.contains("svc-a"));
    }

    #[tokio::test]
    async fn test_invalid_namespace_makes_no_calls() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = Context::new(ProjectConfig::new().with_namespace("9acme"), fake.clone())
            .with_events(sink.clone());

        let err = new_environment_terminator(&ctx, "dev")
            .execute()
            .await
            .unwrap_err();

        assert!(err.is_input());
        assert!(fake.calls().is_empty());
        assert!(sink.events_of_type("teardown.").is_empty());
    }

    #[tokio::test]
    async fn test_failed_service_listing_deletes_nothing() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        fake.fail_list(StackType::Service);
        let (ctx, _) = context(&fake);

        let err = new_environment_terminator(&ctx, "dev")
            .execute()
            .await
            .unwrap_err();

        assert!(err.is_submission());
        assert_eq!(fake.calls(), vec![StackCall::List(StackType::Service)]);
        assert!(fake.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_failed_database_listing_stops_before_consul() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        fake.fail_list(StackType::Database);
        let (ctx, _) = context(&fake);

        let err = new_environment_terminator(&ctx, "dev")
            .execute()
            .await
            .unwrap_err();

        assert!(err.is_submission());
        assert!(fake.calls_for("stackflow-consul-dev").is_empty());
        assert!(fake.contains("db-a"));
        assert_eq!(fake.calls().last(), Some(&StackCall::List(StackType::Database)));
    }

    #[tokio::test]
    async fn test_teardown_can_be_rerun() {
        let fake = Arc::new(FakeStackManager::new());
        populated_environment(&fake);
        let (ctx, _) = context(&fake);

        new_environment_terminator(&ctx, "dev").execute().await.unwrap();
        fake.clear_calls();
        new_environment_terminator(&ctx, "dev").execute().await.unwrap();

        assert!(fake.deleted().iter().all(|name| name.starts_with("stackflow-")));
        assert!(fake.contains("svc-c"));
    }

    #[tokio::test]
    async fn test_service_input_scenarios() {
        let fake = Arc::new(FakeStackManager::new());
        let (ctx, _) = context(&fake);

        let state = shared(ServiceWorkflow::default());
        service_input(&ctx, "checkout", state.clone())
            .execute()
            .await
            .unwrap();
        assert_eq!(state.read().service_name, "checkout");

        let err = new_service_undeployer(&ctx, "", "dev")
            .execute()
            .await
            .unwrap_err();
        assert!(err.is_input());
        assert_eq!(err.to_string(), "Service name must be provided");
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_success_is_exactly_complete_suffix() {
        for (status, success) in [
            ("DELETE_COMPLETE", true),
            ("CREATE_COMPLETE", true),
            ("UPDATE_ROLLBACK_COMPLETE", true),
            ("DELETE_FAILED", false),
            ("ROLLBACK_FAILED", false),
            ("DELETE_IN_PROGRESS", false),
            ("COMPLETE", false),
            ("", false),
        ] {
            assert_eq!(
                StackPhase::classify(status).is_success(),
                status.ends_with("_COMPLETE"),
                "{status}"
            );
            assert_eq!(StackPhase::classify(status).is_success(), success, "{status}");
        }
    }
}
