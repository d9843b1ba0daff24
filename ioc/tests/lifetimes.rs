mod common;

use common::{first, second, third, First, Second, Third};
use std::sync::Arc;
use tiered_ioc::{ContainerBuilder, Error, Lifetime};

// --- Sharing ---

#[test]
fn singleton_is_shared_by_container_and_every_scope() {
  // Arrange
  let container = ContainerBuilder::new()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Singleton, |c| c)
    .unwrap()
    .build();
  let scope_a = container.create_scope().unwrap();
  let scope_b = container.create_scope().unwrap();

  // Act
  let from_container = container.get::<dyn Second>().unwrap();
  let from_a = scope_a.get::<dyn Second>().unwrap();
  let from_b = scope_b.get::<dyn Second>().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&from_container, &from_a));
  assert!(Arc::ptr_eq(&from_a, &from_b));
  assert_eq!(container.singleton_count(), 1);
}

#[test]
fn scoped_is_shared_within_a_scope_only() {
  let container = ContainerBuilder::new()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();
  let scope_a = container.create_scope().unwrap();
  let scope_b = container.create_scope().unwrap();

  let a1 = scope_a.get::<dyn Second>().unwrap();
  let a2 = scope_a.get::<dyn Second>().unwrap();
  let b1 = scope_b.get::<dyn Second>().unwrap();

  assert!(Arc::ptr_eq(&a1, &a2));
  assert!(!Arc::ptr_eq(&a1, &b1));
  assert_eq!(scope_a.scoped_count(), 1);
}

#[test]
fn transient_is_built_on_every_request() {
  let container = ContainerBuilder::new()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Transient, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  let c1 = container.get::<dyn Second>().unwrap();
  let c2 = container.get::<dyn Second>().unwrap();
  let s1 = scope.get::<dyn Second>().unwrap();

  assert!(!Arc::ptr_eq(&c1, &c2));
  assert!(!Arc::ptr_eq(&c1, &s1));
  assert_eq!(container.singleton_count(), 0);
}

#[test]
fn singleton_dependency_is_shared_between_dependents() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecondAndThird>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresThird>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Third, third::RequiresNone>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add_singleton::<first::RequiresSecondAndThird>()
    .unwrap()
    .build();

  let wired = container.get::<first::RequiresSecondAndThird>().unwrap();
  let third = container.get::<dyn Third>().unwrap();

  assert!(Arc::ptr_eq(&*wired.third, &third));
  assert_eq!(
    container.get::<dyn First>().unwrap().graph(),
    "first::RequiresSecondAndThird(second::RequiresThird(third::RequiresNone), third::RequiresNone)"
  );
}

#[test]
fn transient_dependency_is_not_shared_between_dependents() {
  let container = ContainerBuilder::new()
    .add_singleton::<first::RequiresSecondAndThird>()
    .unwrap()
    .add::<dyn Second, second::RequiresThird>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Third, third::RequiresNone>(Lifetime::Transient, |c| c)
    .unwrap()
    .build();

  let wired = container.get::<first::RequiresSecondAndThird>().unwrap();
  let again = container.get::<first::RequiresSecondAndThird>().unwrap();

  assert!(Arc::ptr_eq(&wired, &again));
  let direct = container.get::<dyn Third>().unwrap();
  assert!(!Arc::ptr_eq(&*wired.third, &direct));
}

// --- Permitted combinations ---

#[test]
fn scoped_may_depend_on_singleton() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Scoped, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Singleton, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  let service = scope.get::<dyn First>().unwrap();

  assert_eq!(service.graph(), "first::RequiresSecond(second::RequiresNone)");
}

#[test]
fn scoped_holds_the_container_singleton_in_every_scope() {
  // Arrange
  let container = ContainerBuilder::new()
    .add_scoped::<first::RequiresSecond>()
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Singleton, |c| c)
    .unwrap()
    .build();
  let scope_a = container.create_scope().unwrap();
  let scope_b = container.create_scope().unwrap();

  // Act
  let a = scope_a.get::<first::RequiresSecond>().unwrap();
  let b = scope_b.get::<first::RequiresSecond>().unwrap();

  // Assert
  assert!(!Arc::ptr_eq(&a, &b));
  assert!(Arc::ptr_eq(&*a.second, &scope_a.get::<dyn Second>().unwrap()));
  assert!(Arc::ptr_eq(&*a.second, &scope_b.get::<dyn Second>().unwrap()));
  assert!(Arc::ptr_eq(&*b.second, &container.get::<dyn Second>().unwrap()));
}

#[test]
fn scoped_may_depend_on_scoped() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Scoped, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  assert_eq!(
    scope.get::<dyn First>().unwrap().graph(),
    "first::RequiresSecond(second::RequiresNone)"
  );
  assert_eq!(scope.scoped_count(), 2);
}

#[test]
fn scoped_may_depend_on_transient_that_depends_on_singleton() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Scoped, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresThird>(Lifetime::Transient, |c| c)
    .unwrap()
    .add::<dyn Third, third::RequiresNone>(Lifetime::Singleton, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  assert_eq!(
    scope.get::<dyn First>().unwrap().graph(),
    "first::RequiresSecond(second::RequiresThird(third::RequiresNone))"
  );
}

#[test]
fn singleton_may_depend_on_transient() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Transient, |c| c)
    .unwrap()
    .build();

  assert_eq!(
    container.get::<dyn First>().unwrap().graph(),
    "first::RequiresSecond(second::RequiresNone)"
  );
}

#[test]
fn transient_in_a_scope_may_depend_on_scoped() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Transient, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  assert!(scope.get::<dyn First>().is_ok());
}

#[test]
fn singleton_requested_from_a_scope_is_built_under_the_singleton_boundary() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  let err = scope.get::<dyn First>().unwrap_err();

  assert!(matches!(
    err,
    Error::LifetimeViolation {
      lifetime: Lifetime::Scoped,
      owner: Lifetime::Singleton,
      ..
    }
  ));
}

// --- Violations ---

#[test]
fn singleton_cannot_depend_on_scoped() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();

  let err = container.get::<dyn First>().unwrap_err();

  match err {
    Error::LifetimeViolation {
      dependent,
      dependency,
      lifetime,
      owner,
    } => {
      assert!(dependent.contains("First"));
      assert!(dependency.contains("Second"));
      assert_eq!(lifetime, Lifetime::Scoped);
      assert_eq!(owner, Lifetime::Singleton);
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(container.singleton_count(), 0);
}

#[test]
fn transient_inherits_the_singleton_boundary() {
  // Singleton -> Transient -> Scoped must fail even though Transient -> Scoped is
  // fine on its own.
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresThird>(Lifetime::Transient, |c| c)
    .unwrap()
    .add::<dyn Third, third::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  let err = scope.get::<dyn First>().unwrap_err();

  match err {
    Error::LifetimeViolation {
      dependent, owner, ..
    } => {
      assert!(dependent.contains("Second"));
      assert_eq!(owner, Lifetime::Singleton);
    }
    other => panic!("unexpected error: {other}"),
  }
  // The transient itself is fine when resolved from the scope.
  assert!(scope.get::<dyn Second>().is_ok());
}

#[test]
fn transient_resolved_from_the_container_cannot_reach_scoped() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Transient, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();

  let err = container.get::<dyn First>().unwrap_err();

  match err {
    Error::LifetimeViolation {
      dependent,
      dependency,
      lifetime,
      owner,
    } => {
      assert!(dependent.contains("First"));
      assert!(dependency.contains("Second"));
      assert_eq!(lifetime, Lifetime::Scoped);
      assert_eq!(owner, Lifetime::Singleton);
    }
    other => panic!("unexpected error: {other}"),
  }
  // The same transient is fine from a scope.
  let scope = container.create_scope().unwrap();
  assert!(scope.get::<dyn First>().is_ok());
}

#[test]
fn scoped_is_unreachable_from_the_container() {
  let container = ContainerBuilder::new()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();

  let err = container.get::<dyn Second>().unwrap_err();

  match err {
    Error::LifetimeViolation { dependent, .. } => assert_eq!(dependent, "container"),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn violation_message_lists_the_permitted_lifetimes() {
  let container = ContainerBuilder::new()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();

  let message = container.get::<dyn Second>().unwrap_err().to_string();

  assert!(message.contains("Singleton"));
  assert!(message.contains("Transient"));
}

// --- Missing services ---

#[test]
fn missing_dependency_is_reported_as_unconfigured() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();
  let scope = container.create_scope().unwrap();

  let err = scope.get::<dyn First>().unwrap_err();

  assert!(err.is_unconfigured());
  assert!(err.to_string().contains("Second"));
}

#[test]
fn try_get_returns_none_only_for_unconfigured_contracts() {
  let container = ContainerBuilder::new()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();

  assert!(container.try_get::<dyn Third>().unwrap().is_none());
  assert!(container.try_get::<dyn Second>().is_err());
}

#[test]
fn try_get_reports_a_missing_dependency_of_a_registered_contract() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresSecond>(Lifetime::Singleton, |c| c)
    .unwrap()
    .build();

  let err = match container.try_get::<dyn First>() {
    Err(err) => err,
    Ok(found) => panic!("expected an error, got {:?}", found.is_some()),
  };

  assert!(err.is_unconfigured());
  assert!(err.to_string().contains("Second"));
  assert!(container.try_get::<dyn Third>().unwrap().is_none());
}

#[test]
fn undeclared_fields_are_left_alone() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::IgnoresSecond>(Lifetime::Singleton, |c| c)
    .unwrap()
    .build();

  assert_eq!(
    container.get::<dyn First>().unwrap().graph(),
    "first::IgnoresSecond(false)"
  );
}

#[test]
fn embedded_base_properties_are_injected() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::Extended>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Singleton, |c| c)
    .unwrap()
    .add::<dyn Third, third::RequiresNone>(Lifetime::Transient, |c| c)
    .unwrap()
    .build();

  assert_eq!(
    container.get::<dyn First>().unwrap().graph(),
    "first::Extended(second::RequiresNone, third::RequiresNone)"
  );
}
