mod common;

use jiff::civil::date;

use almoner_cases::assignments::{AssignmentFilter, NewAssignment};
use almoner_cases::error::CaseError;
use almoner_core::models::assignment::{AssignmentKind, AssignmentStatus};
use almoner_core::models::user::Role;

use common::Fixture;

#[tokio::test]
async fn create_requires_a_live_patient_and_active_department() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;

    let created = fx.assignment(patient.value.id, dep.value.id).await;
    assert_eq!(created.value.status, AssignmentStatus::Open);
    assert_eq!(created.value.assignee_id, None);

    let unknown_patient = fx
        .assignments
        .create(
            &fx.actor,
            NewAssignment {
                patient_id: uuid::Uuid::new_v4(),
                requested_by_department: dep.value.id,
                kind: AssignmentKind::Placement,
                description: "find a care home".to_string(),
                due_on: None,
            },
        )
        .await;
    assert!(matches!(unknown_patient, Err(CaseError::Validation(_))));

    let blank = fx
        .assignments
        .create(
            &fx.actor,
            NewAssignment {
                patient_id: patient.value.id,
                requested_by_department: dep.value.id,
                kind: AssignmentKind::Placement,
                description: "   ".to_string(),
                due_on: None,
            },
        )
        .await;
    assert!(matches!(blank, Err(CaseError::Validation(_))));
}

#[tokio::test]
async fn assigning_starts_work_and_unassigning_returns_it() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;
    let assignment = fx.assignment(patient.value.id, dep.value.id).await;
    let worker = fx.user("worker", vec![Role::SocialWorker], true).await;

    let assigned = fx
        .assignments
        .assign(&fx.actor, assignment.value.id, &assignment.etag, Some(worker.id))
        .await
        .unwrap();
    assert_eq!(assigned.value.status, AssignmentStatus::InProgress);
    assert_eq!(assigned.value.assignee_id, Some(worker.id));

    let released = fx
        .assignments
        .assign(&fx.actor, assignment.value.id, &assigned.etag, None)
        .await
        .unwrap();
    assert_eq!(released.value.status, AssignmentStatus::Open);
    assert_eq!(released.value.assignee_id, None);
}

#[tokio::test]
async fn assignee_must_be_able_to_work_assignments() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;
    let assignment = fx.assignment(patient.value.id, dep.value.id).await;

    let staff = fx.user("nurse", vec![Role::DepartmentStaff], true).await;
    let retired = fx.user("retired", vec![Role::SocialWorker], false).await;

    for user in [staff.id, retired.id, uuid::Uuid::new_v4()] {
        let result = fx
            .assignments
            .assign(&fx.actor, assignment.value.id, &assignment.etag, Some(user))
            .await;
        assert!(matches!(result, Err(CaseError::Validation(_))));
    }
}

#[tokio::test]
async fn transitions_follow_the_state_machine() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;
    let assignment = fx.assignment(patient.value.id, dep.value.id).await;
    let id = assignment.value.id;

    let skip = fx
        .assignments
        .transition(&fx.actor, id, &assignment.etag, AssignmentStatus::Completed)
        .await;
    assert!(matches!(skip, Err(CaseError::InvalidState(_))));

    let started = fx
        .assignments
        .transition(&fx.actor, id, &assignment.etag, AssignmentStatus::InProgress)
        .await
        .unwrap();
    let unassigned_completion = fx
        .assignments
        .transition(&fx.actor, id, &started.etag, AssignmentStatus::Completed)
        .await;
    assert!(matches!(
        unassigned_completion,
        Err(CaseError::InvalidState(_))
    ));

    let worker = fx.user("worker", vec![Role::SocialWorker], true).await;
    let assigned = fx
        .assignments
        .assign(&fx.actor, id, &started.etag, Some(worker.id))
        .await
        .unwrap();
    let done = fx
        .assignments
        .transition(&fx.actor, id, &assigned.etag, AssignmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.value.status, AssignmentStatus::Completed);
    assert!(done.value.closed_at.is_some());

    let reopen = fx
        .assignments
        .transition(&fx.actor, id, &done.etag, AssignmentStatus::Open)
        .await;
    assert!(matches!(reopen, Err(CaseError::InvalidState(_))));
    let note = fx.assignments.add_note(&fx.actor, id, &done.etag, "late").await;
    assert!(matches!(note, Err(CaseError::InvalidState(_))));
}

#[tokio::test]
async fn notes_are_attributed_and_must_not_be_blank() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;
    let assignment = fx.assignment(patient.value.id, dep.value.id).await;

    let blank = fx
        .assignments
        .add_note(&fx.actor, assignment.value.id, &assignment.etag, "  ")
        .await;
    assert!(matches!(blank, Err(CaseError::Validation(_))));

    let noted = fx
        .assignments
        .add_note(
            &fx.actor,
            assignment.value.id,
            &assignment.etag,
            " called the passport office ",
        )
        .await
        .unwrap();
    assert_eq!(noted.value.notes.len(), 1);
    assert_eq!(noted.value.notes[0].body, "called the passport office");
    assert_eq!(noted.value.notes[0].author_id, fx.actor.id);
}

#[tokio::test]
async fn list_filters_overdue_and_sorts_by_due_date() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let other = fx.department("NEURO").await;
    let patient = fx.patient("Orlova", dep.value.id).await;
    let today = jiff::Timestamp::now()
        .to_zoned(jiff::tz::TimeZone::UTC)
        .date();

    let mut ids = Vec::new();
    for (department, due) in [
        (dep.value.id, None),
        (dep.value.id, Some(today.saturating_add(jiff::Span::new().days(10)))),
        (other.value.id, Some(today)),
    ] {
        let created = fx
            .assignments
            .create(
                &fx.actor,
                NewAssignment {
                    patient_id: patient.value.id,
                    requested_by_department: department,
                    kind: AssignmentKind::Benefits,
                    description: "apply for benefits".to_string(),
                    due_on: due,
                },
            )
            .await
            .unwrap();
        ids.push(created.value.id);
    }

    let all: Vec<_> = fx
        .assignments
        .list(&AssignmentFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.value.id)
        .collect();
    assert_eq!(all, vec![ids[2], ids[1], ids[0]]);

    let from_card = fx
        .assignments
        .list(&AssignmentFilter {
            department_id: Some(dep.value.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(from_card.len(), 2);

    let overdue_later = fx
        .assignments
        .list(&AssignmentFilter {
            overdue_as_of: Some(today.saturating_add(jiff::Span::new().days(1))),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(overdue_later.len(), 1);
    assert_eq!(overdue_later[0].value.id, ids[2]);

    let overdue_far = fx
        .assignments
        .list(&AssignmentFilter {
            overdue_as_of: Some(date(2999, 1, 1)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(overdue_far.len(), 2);
}
