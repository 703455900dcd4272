/// Integration tests for the assignment reconciler and the services built on it
///
/// Everything runs against `MemoryStore`, so no database is needed.

use chrono::{Duration, Utc};
use std::sync::Arc;
use taskboard_shared::models::{Task, TaskInput, User, UserInput, UNASSIGNED};
use taskboard_shared::reconcile::AssignmentReconciler;
use taskboard_shared::service::{TaskService, UserService};
use taskboard_shared::store::{MemoryStore, Store};
use taskboard_shared::DomainError;
use uuid::Uuid;

struct Harness {
    store: Arc<MemoryStore>,
    reconciler: AssignmentReconciler,
    users: UserService,
    tasks: TaskService,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            reconciler: AssignmentReconciler::new(store.clone()),
            users: UserService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
        }
    }

    async fn user(&self, name: &str, pending: Vec<Uuid>) -> User {
        self.users
            .create(UserInput {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                pending_tasks: pending,
            })
            .await
            .unwrap()
    }

    async fn task(&self, name: &str, assignee: Option<Uuid>) -> Task {
        self.tasks
            .create(task_input(name, assignee, false))
            .await
            .unwrap()
    }

    async fn reload_user(&self, id: Uuid) -> User {
        self.store.find_user_by_id(id).await.unwrap().unwrap()
    }

    async fn reload_task(&self, id: Uuid) -> Task {
        self.store.find_task_by_id(id).await.unwrap().unwrap()
    }
}

fn task_input(name: &str, assignee: Option<Uuid>, completed: bool) -> TaskInput {
    TaskInput {
        name: name.to_string(),
        description: String::new(),
        deadline: Utc::now() + Duration::days(7),
        completed,
        assigned_user: assignee,
    }
}

fn user_input(user: &User, pending: Vec<Uuid>) -> UserInput {
    UserInput {
        name: user.name.clone(),
        email: user.email.clone(),
        pending_tasks: pending,
    }
}

#[tokio::test]
async fn test_user_write_assigns_new_and_unassigns_removed() {
    let h = Harness::new();
    let t1 = h.task("t1", None).await;
    let t2 = h.task("t2", None).await;
    let t3 = h.task("t3", None).await;
    let alice = h.user("Alice", vec![t1.id, t2.id]).await;

    let alice = h.users.update(alice.id, user_input(&alice, vec![t2.id, t3.id])).await.unwrap();

    for id in [t2.id, t3.id] {
        let task = h.reload_task(id).await;
        assert_eq!(task.assigned_user, Some(alice.id));
        assert_eq!(task.assigned_user_name, "Alice");
        assert!(!task.completed);
    }

    let dropped = h.reload_task(t1.id).await;
    assert_eq!(dropped.assigned_user, None);
    assert_eq!(dropped.assigned_user_name, UNASSIGNED);
    assert_eq!(h.reload_user(alice.id).await.pending_tasks, vec![t2.id, t3.id]);
}

#[tokio::test]
async fn test_user_write_reopens_completed_tasks() {
    let h = Harness::new();
    let done = h.tasks.create(task_input("done", None, true)).await.unwrap();

    let alice = h.user("Alice", vec![done.id]).await;

    let task = h.reload_task(done.id).await;
    assert!(!task.completed);
    assert_eq!(task.assigned_user, Some(alice.id));
}

#[tokio::test]
async fn test_user_write_is_idempotent() {
    let h = Harness::new();
    let t1 = h.task("t1", None).await;
    let alice = h.user("Alice", vec![t1.id]).await;

    let before_user = h.reload_user(alice.id).await;
    let before_task = h.reload_task(t1.id).await;

    let tasks = h.reconciler.ensure_tasks_exist(&[t1.id]).await.unwrap();
    h.reconciler
        .reconcile_on_user_write(&before_user, &[t1.id], &[t1.id], &tasks)
        .await
        .unwrap();
    h.reconciler
        .reconcile_on_user_write(&before_user, &[t1.id], &[t1.id], &tasks)
        .await
        .unwrap();

    assert_eq!(h.reload_user(alice.id).await, before_user);
    assert_eq!(h.reload_task(t1.id).await, before_task);
}

#[tokio::test]
async fn test_steal_moves_task_between_users() {
    let h = Harness::new();
    let t = h.task("shared", None).await;
    let alice = h.user("Alice", vec![t.id]).await;
    assert_eq!(h.reload_user(alice.id).await.pending_tasks, vec![t.id]);

    let bob = h.user("Bob", vec![t.id]).await;

    assert!(!h.reload_user(alice.id).await.pending_tasks.contains(&t.id));
    assert!(h.reload_user(bob.id).await.pending_tasks.contains(&t.id));

    let task = h.reload_task(t.id).await;
    assert_eq!(task.assigned_user, Some(bob.id));
    assert_eq!(task.assigned_user_name, "Bob");
}

#[tokio::test]
async fn test_rename_propagates_to_assigned_tasks() {
    let h = Harness::new();
    let t = h.task("t", None).await;
    let alice = h.user("Alice", vec![t.id]).await;

    let renamed = UserInput {
        name: "Alicia".to_string(),
        email: alice.email.clone(),
        pending_tasks: vec![t.id],
    };
    h.users.update(alice.id, renamed).await.unwrap();

    assert_eq!(h.reload_task(t.id).await.assigned_user_name, "Alicia");
}

#[tokio::test]
async fn test_completion_toggles_pending_membership() {
    let h = Harness::new();
    let alice = h.user("Alice", Vec::new()).await;
    let t = h.task("t", Some(alice.id)).await;
    assert_eq!(h.reload_user(alice.id).await.pending_tasks, vec![t.id]);

    h.tasks.update(t.id, task_input("t", Some(alice.id), true)).await.unwrap();
    assert!(h.reload_user(alice.id).await.pending_tasks.is_empty());

    h.tasks.update(t.id, task_input("t", Some(alice.id), false)).await.unwrap();
    assert_eq!(h.reload_user(alice.id).await.pending_tasks, vec![t.id]);
}

#[tokio::test]
async fn test_task_reassignment_moves_pending_entry() {
    let h = Harness::new();
    let alice = h.user("Alice", Vec::new()).await;
    let bob = h.user("Bob", Vec::new()).await;
    let t = h.task("t", Some(alice.id)).await;

    let task = h.tasks.update(t.id, task_input("t", Some(bob.id), false)).await.unwrap();

    assert_eq!(task.assigned_user_name, "Bob");
    assert!(h.reload_user(alice.id).await.pending_tasks.is_empty());
    assert_eq!(h.reload_user(bob.id).await.pending_tasks, vec![t.id]);
}

#[tokio::test]
async fn test_completed_task_created_for_user_stays_off_pending_list() {
    let h = Harness::new();
    let alice = h.user("Alice", Vec::new()).await;

    let t = h.tasks.create(task_input("t", Some(alice.id), true)).await.unwrap();

    assert_eq!(t.assigned_user, Some(alice.id));
    assert_eq!(t.assigned_user_name, "Alice");
    assert!(t.completed);
    assert!(h.reload_user(alice.id).await.pending_tasks.is_empty());
}

#[tokio::test]
async fn test_reassigning_and_completing_together_clears_both_users() {
    let h = Harness::new();
    let alice = h.user("Alice", Vec::new()).await;
    let bob = h.user("Bob", Vec::new()).await;
    let t = h.task("t", Some(alice.id)).await;
    assert_eq!(h.reload_user(alice.id).await.pending_tasks, vec![t.id]);

    let task = h.tasks.update(t.id, task_input("t", Some(bob.id), true)).await.unwrap();

    assert_eq!(task.assigned_user, Some(bob.id));
    assert_eq!(task.assigned_user_name, "Bob");
    assert!(task.completed);
    assert!(h.reload_user(alice.id).await.pending_tasks.is_empty());
    assert!(h.reload_user(bob.id).await.pending_tasks.is_empty());
}

#[tokio::test]
async fn test_unassigning_task_sweeps_every_pending_list() {
    let h = Harness::new();
    let alice = h.user("Alice", Vec::new()).await;
    let t = h.task("t", Some(alice.id)).await;

    // Simulate drift: Bob lists the task without owning it
    let mut bob = h.user("Bob", Vec::new()).await;
    bob.pending_tasks.push(t.id);
    h.store.save_user(&bob).await.unwrap();

    let task = h.tasks.update(t.id, task_input("t", None, false)).await.unwrap();

    assert_eq!(task.assigned_user_name, UNASSIGNED);
    assert!(h.reload_user(alice.id).await.pending_tasks.is_empty());
    assert!(h.reload_user(bob.id).await.pending_tasks.is_empty());
}

#[tokio::test]
async fn test_deleting_user_unassigns_their_tasks() {
    let h = Harness::new();
    let t1 = h.task("t1", None).await;
    let t2 = h.task("t2", None).await;
    let alice = h.user("Alice", vec![t1.id, t2.id]).await;

    h.users.delete(alice.id).await.unwrap();

    for id in [t1.id, t2.id] {
        let task = h.reload_task(id).await;
        assert_eq!(task.assigned_user, None);
        assert_eq!(task.assigned_user_name, UNASSIGNED);
    }
    assert!(h.store.find_user_by_id(alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleting_task_removes_it_from_assignee() {
    let h = Harness::new();
    let alice = h.user("Alice", Vec::new()).await;
    let keep = h.task("keep", Some(alice.id)).await;
    let gone = h.task("gone", Some(alice.id)).await;

    h.tasks.delete(gone.id).await.unwrap();

    assert_eq!(h.reload_user(alice.id).await.pending_tasks, vec![keep.id]);
}

#[tokio::test]
async fn test_ensure_tasks_exist_reports_missing_ids() {
    let h = Harness::new();
    let a = h.task("a", None).await;
    let b = Uuid::new_v4();

    match h.reconciler.ensure_tasks_exist(&[a.id, b]).await {
        Err(DomainError::ReferenceError { missing }) => assert_eq!(missing, vec![b]),
        other => panic!("expected ReferenceError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_user_with_unknown_task_writes_nothing() {
    let h = Harness::new();
    let result = h
        .users
        .create(UserInput {
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            pending_tasks: vec![Uuid::new_v4()],
        })
        .await;

    assert!(matches!(result, Err(DomainError::ReferenceError { .. })));
    assert_eq!(h.users.count(&Default::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let h = Harness::new();
    h.user("Alice", Vec::new()).await;

    let result = h
        .users
        .create(UserInput {
            name: "Other".to_string(),
            email: "alice@example.com".to_string(),
            pending_tasks: Vec::new(),
        })
        .await;

    assert!(matches!(result, Err(DomainError::Conflict(ref msg)) if msg == "Email already exists"));
}

#[tokio::test]
async fn test_task_with_unknown_assignee_is_rejected() {
    let h = Harness::new();
    let result = h.tasks.create(task_input("t", Some(Uuid::new_v4()), false)).await;

    assert!(matches!(result, Err(DomainError::InvalidArgument(ref msg)) if msg == "Assigned user not found"));
    assert_eq!(h.tasks.count(&Default::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_entities_are_not_found() {
    let h = Harness::new();
    let id = Uuid::new_v4();

    assert!(matches!(h.users.get(id).await, Err(DomainError::NotFound(_))));
    assert!(matches!(h.tasks.delete(id).await, Err(DomainError::NotFound(_))));
    assert!(matches!(
        h.tasks.update(id, task_input("t", None, false)).await,
        Err(DomainError::NotFound(_))
    ));
}
