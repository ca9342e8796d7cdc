use crate::{
    db::{LoadRequest, LoadTarget, Loader, Session},
    error::{ErrorKind, LoadErrorKind, PlanErrorKind, StateErrorKind},
};
use lensdb_core::{
    error::InternalError,
    key::InstanceKey,
    model::{EntityModel, MetadataCatalog, PropertyModel},
    plan::{FetchPlanRegistry, PLAN_LOCAL},
    state::{EntityStates, LifecycleState, RemoveMode},
};
use std::sync::Arc;

fn catalog() -> MetadataCatalog {
    let mut catalog = MetadataCatalog::new();

    catalog
        .register(
            EntityModel::new("customer")
                .with_property(PropertyModel::system("id"))
                .with_property(PropertyModel::system("version"))
                .with_property(PropertyModel::scalar("name"))
                .with_property(PropertyModel::scalar("email"))
                .with_property(PropertyModel::scalar("status"))
                .with_property(PropertyModel::reference("owner", "employee"))
                .with_display("name"),
        )
        .expect("customer should register");

    catalog
        .register(
            EntityModel::new("employee")
                .with_property(PropertyModel::system("id"))
                .with_property(PropertyModel::scalar("name"))
                .with_display("name"),
        )
        .expect("employee should register");

    catalog
}

///
/// EchoLoader
/// Hydrates exactly the targeted keys and registers them with the tracker,
/// standing in for the external query-execution collaborator.
///

struct EchoLoader;

impl Loader for EchoLoader {
    fn execute(
        &self,
        request: &LoadRequest,
        states: &mut EntityStates,
    ) -> Result<Vec<InstanceKey>, InternalError> {
        let keys: Vec<InstanceKey> = match request.target() {
            LoadTarget::Id(key) => vec![InstanceKey::new(request.entity(), key.clone())],
            LoadTarget::Ids(keys) => keys
                .iter()
                .map(|key| InstanceKey::new(request.entity(), key.clone()))
                .collect(),
            LoadTarget::All | LoadTarget::Query(_) => Vec::new(),
        };

        for key in &keys {
            states.register_hydrated(key.clone(), request.fetch_plan().root())?;
        }

        Ok(keys)
    }
}

fn session() -> Session {
    let catalog = Arc::new(catalog());
    let mut plans = FetchPlanRegistry::new();
    plans
        .register_presets(&catalog)
        .expect("preset derivation should succeed");

    Session::new(catalog, Arc::new(plans), Arc::new(EchoLoader))
}

fn customer(id: u64) -> InstanceKey {
    InstanceKey::new("customer", id)
}

#[test]
fn load_by_id_tracks_partial_hydration() {
    let session = session();

    let key = session
        .load("customer")
        .id(7_u64)
        .fetch_plan(|plan| plan.add_property("name"))
        .expect("name should be declared")
        .execute()
        .expect("load should execute")
        .one()
        .expect("exactly one instance should match");

    assert_eq!(key, customer(7));
    assert!(session.is_loaded(&key, "name"));
    assert!(session.is_loaded(&key, "id"), "system attributes count as loaded");
    assert!(!session.is_loaded(&key, "status"));
    assert_eq!(
        session.with_states(|states| states.get(&key).map(|r| r.state)),
        Some(LifecycleState::ManagedPartial)
    );

    let err = session
        .require_loaded(&key, "status")
        .expect_err("guarded access outside the loaded set should fail");
    assert_eq!(err.kind, ErrorKind::State(StateErrorKind::NotLoaded));
}

#[test]
fn fetch_properties_expands_dotted_paths() {
    let session = session();

    let key = session
        .load("customer")
        .id(1_u64)
        .fetch_properties(["name", "owner.name"])
        .expect("declared paths should build")
        .execute()
        .expect("load should execute")
        .one()
        .expect("exactly one instance should match");

    assert!(session.is_loaded(&key, "name"));
    assert!(session.is_loaded(&key, "owner"));
    assert!(!session.is_loaded(&key, "email"));
}

#[test]
fn named_plans_resolve_from_the_session_registry() {
    let session = session();

    let key = session
        .load("customer")
        .id(3_u64)
        .named_plan(PLAN_LOCAL)
        .expect("local preset should resolve")
        .execute()
        .expect("load should execute")
        .one()
        .expect("exactly one instance should match");

    assert!(session.is_loaded(&key, "name"));
    assert!(session.is_loaded(&key, "email"));
    assert!(session.is_loaded(&key, "status"));

    let err = session
        .load("customer")
        .named_plan("nonexistent")
        .expect_err("unregistered plan name should fail");
    assert_eq!(err.kind, ErrorKind::Plan(PlanErrorKind::UnknownNamedPlan));
}

#[test]
fn access_policy_prunes_before_the_loader_runs() {
    let catalog = Arc::new(catalog());
    let session = Session::new(
        catalog,
        Arc::new(FetchPlanRegistry::new()),
        Arc::new(EchoLoader),
    )
    .access_policy(|entity, property| !(entity == "customer" && property == "email"));

    let key = session
        .load("customer")
        .id(5_u64)
        .fetch_properties(["name", "email"])
        .expect("declared paths should build")
        .execute()
        .expect("load should execute")
        .one()
        .expect("exactly one instance should match");

    assert!(session.is_loaded(&key, "name"));
    assert!(
        !session.is_loaded(&key, "email"),
        "the denied attribute must never reach the loader"
    );
}

#[test]
fn response_extractors_enforce_cardinality() {
    let session = session();

    let err = session
        .load("customer")
        .ids([1_u64, 2_u64])
        .execute()
        .expect("load should execute")
        .one()
        .expect_err("two matches should not extract as one");
    assert_eq!(err.kind, ErrorKind::Load(LoadErrorKind::NotUnique));

    let err = session
        .load_by_query("customer")
        .query("status = 'active'")
        .execute()
        .expect("query loads route through the loader")
        .one()
        .expect_err("an empty response should not extract as one");
    assert_eq!(err.kind, ErrorKind::Load(LoadErrorKind::NotFound));

    let none = session
        .load("customer")
        .execute()
        .expect("load should execute")
        .one_opt()
        .expect("an empty response extracts as None");
    assert!(none.is_none());
}

#[test]
fn unknown_entities_fail_before_execution() {
    let session = session();

    let err = session
        .load("ghost")
        .execute()
        .expect_err("undeclared entity should fail plan construction");
    assert_eq!(err.kind, ErrorKind::Plan(PlanErrorKind::UnknownEntity));
}

#[test]
fn lifecycle_surface_routes_through_the_tracker() {
    let session = session();
    let key = customer(9);

    session.register_new(key.clone());
    session.persist(&key).expect("persist of NEW should succeed");
    assert_eq!(
        session.with_states(|states| states.get(&key).map(|r| r.state)),
        Some(LifecycleState::ManagedFull)
    );

    session
        .remove(&key, RemoveMode::Soft)
        .expect("soft remove should succeed");
    assert_eq!(
        session.with_states(|states| states.get(&key).map(|r| r.state)),
        Some(LifecycleState::Removed)
    );

    session
        .remove(&key, RemoveMode::Hard)
        .expect("hard remove should succeed");
    assert!(session.with_states(|states| states.get(&key).is_none()));
}

#[test]
fn detached_records_merge_back_as_managed() {
    let session = session();

    let key = session
        .load("customer")
        .id(4_u64)
        .fetch_plan(|plan| plan.add_property("name"))
        .expect("name should be declared")
        .execute()
        .expect("load should execute")
        .one()
        .expect("exactly one instance should match");

    session.detach_all();
    let detached = session.evict(&key).expect("detached record should evict");
    assert_eq!(detached.state, LifecycleState::Detached);

    session
        .merge_detached(key.clone(), &detached)
        .expect("merge of a detached record should succeed");
    assert_eq!(
        session.with_states(|states| states.get(&key).map(|r| r.state)),
        Some(LifecycleState::ManagedPartial)
    );
    assert!(session.is_loaded(&key, "name"));
}
