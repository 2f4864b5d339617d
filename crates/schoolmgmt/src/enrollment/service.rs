use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::access::{
    authenticate, filter_visible, Actor, Ownable, ResourceKind, Scope, ScopeResolver, Visibility,
    WriteAction,
};
use crate::directory::domain::{Course, Department, EntityId, Student};
use crate::directory::repository::{Record, SchoolRepository};
use crate::directory::service::{authorize, check_references, ensure_rule_allows};
use crate::directory::validation::{FieldErrors, FieldWriter, WriteMode};
use crate::error::ServiceError;

use super::domain::{
    CourseEnrollmentView, Enrollment, EnrollmentFilter, EnrollmentInput, EnrollmentRequest,
    EnrollmentStats, EnrollmentStatus, EnrollmentView, StudentEnrollmentView, MAX_GRADE_LEN,
};

pub const GRADE_REQUIRES_COMPLETION: &str = "A grade can only be set on a completed enrollment.";

/// Enrollment lifecycle on top of the shared store.
pub struct EnrollmentService<R> {
    repository: Arc<R>,
}

impl<R> EnrollmentService<R>
where
    R: SchoolRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn authenticate(&self, user_id: Option<EntityId>) -> Result<Actor, ServiceError> {
        Ok(authenticate(self.repository.as_ref(), user_id)?)
    }

    /// Enroll a student; fails while another `enrolled` row exists for the pair.
    pub fn enroll(
        &self,
        actor: &Actor,
        request: EnrollmentRequest,
    ) -> Result<EnrollmentView, ServiceError> {
        ensure_rule_allows(actor, ResourceKind::Enrollment, WriteAction::Create)?;

        let mut enrollment = Enrollment::default();
        let mut writer = FieldWriter::new(WriteMode::Create);
        writer.required_reference("student", request.student, &mut enrollment.student);
        writer.required_reference("course", request.course, &mut enrollment.course);
        writer.optional_text("notes", request.notes, None, &mut enrollment.notes);
        writer.finish()?;
        check_references(self.repository.as_ref(), &enrollment)?;

        let scope = self.scope_of(&enrollment)?;
        authorize(actor, ResourceKind::Enrollment, WriteAction::Create, &scope)?;
        self.ensure_no_active_duplicate(&enrollment)?;

        let now = Utc::now();
        enrollment.enrollment_date = now;
        enrollment.last_updated = now;
        let stored = self.repository.insert(enrollment)?;
        info!(
            enrollment = %stored.id,
            student = %stored.student,
            course = %stored.course,
            "student enrolled"
        );
        self.describe_one(stored)
    }

    pub fn retrieve(&self, actor: &Actor, id: EntityId) -> Result<EnrollmentView, ServiceError> {
        let (enrollment, _) = self.visible(actor, id)?;
        self.describe_one(enrollment)
    }

    /// Visible enrollments matching `filter`, newest first.
    pub fn list(
        &self,
        actor: &Actor,
        filter: EnrollmentFilter,
    ) -> Result<Vec<EnrollmentView>, ServiceError> {
        let rows = self.visible_rows(actor, filter)?;
        let mut names = Names::new(self.repository.as_ref());
        rows.into_iter()
            .map(|enrollment| names.enrollment_view(enrollment))
            .collect()
    }

    pub fn update(
        &self,
        actor: &Actor,
        id: EntityId,
        input: EnrollmentInput,
        mode: WriteMode,
    ) -> Result<EnrollmentView, ServiceError> {
        let (mut enrollment, scope) = self.visible(actor, id)?;
        authorize(actor, ResourceKind::Enrollment, WriteAction::Update, &scope)?;

        let grade_requested = input
            .grade
            .as_deref()
            .is_some_and(|grade| !grade.trim().is_empty());
        let previous_status = enrollment.status;
        let mut writer = FieldWriter::new(mode);
        writer.required_reference("student", input.student, &mut enrollment.student);
        writer.required_reference("course", input.course, &mut enrollment.course);
        writer.set(input.status, &mut enrollment.status);
        writer.optional_text("grade", input.grade, Some(MAX_GRADE_LEN), &mut enrollment.grade);
        writer.optional_text("notes", input.notes, None, &mut enrollment.notes);
        // A graded row may only leave `completed` if the same write clears the grade.
        let leaves_completion = previous_status == EnrollmentStatus::Completed
            && enrollment.status != EnrollmentStatus::Completed;
        let graded = enrollment
            .grade
            .as_deref()
            .is_some_and(|grade| !grade.trim().is_empty());
        if (grade_requested || leaves_completion)
            && graded
            && enrollment.status != EnrollmentStatus::Completed
        {
            writer.error("grade", GRADE_REQUIRES_COMPLETION);
        }
        writer.finish()?;
        check_references(self.repository.as_ref(), &enrollment)?;

        let moved_to = self.scope_of(&enrollment)?;
        if moved_to != scope {
            authorize(actor, ResourceKind::Enrollment, WriteAction::Update, &moved_to)?;
        }

        let stored = self.save(enrollment)?;
        info!(enrollment = %id, status = stored.status.label(), "enrollment updated");
        self.describe_one(stored)
    }

    pub fn delete(&self, actor: &Actor, id: EntityId) -> Result<usize, ServiceError> {
        let (_, scope) = self.visible(actor, id)?;
        authorize(actor, ResourceKind::Enrollment, WriteAction::Delete, &scope)?;

        let removed = self.repository.delete::<Enrollment>(id)?;
        info!(enrollment = %id, "enrollment deleted");
        Ok(removed)
    }

    /// Mark an enrollment dropped. Dropping twice is harmless.
    pub fn drop_enrollment(
        &self,
        actor: &Actor,
        id: EntityId,
    ) -> Result<EnrollmentView, ServiceError> {
        let (mut enrollment, scope) = self.visible(actor, id)?;
        authorize(actor, ResourceKind::Enrollment, WriteAction::Update, &scope)?;

        enrollment.mark_dropped();
        let stored = self.save(enrollment)?;
        info!(enrollment = %id, "enrollment dropped");
        self.describe_one(stored)
    }

    /// Mark an enrollment completed, recording `grade` when one is given.
    pub fn complete_enrollment(
        &self,
        actor: &Actor,
        id: EntityId,
        grade: Option<String>,
    ) -> Result<EnrollmentView, ServiceError> {
        let (mut enrollment, scope) = self.visible(actor, id)?;
        authorize(actor, ResourceKind::Enrollment, WriteAction::Update, &scope)?;

        let grade = clean_grade(grade)?;
        enrollment.mark_completed(grade);
        let stored = self.save(enrollment)?;
        info!(
            enrollment = %id,
            grade = stored.grade.as_deref().unwrap_or(""),
            "enrollment completed"
        );
        self.describe_one(stored)
    }

    pub fn list_for_student(
        &self,
        actor: &Actor,
        student: EntityId,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<StudentEnrollmentView>, ServiceError> {
        self.ensure_visible::<Student>(actor, student)?;

        let filter = EnrollmentFilter {
            student: Some(student.0),
            ..EnrollmentFilter::status(status)
        };
        let mut names = Names::new(self.repository.as_ref());
        self.visible_rows(actor, filter)?
            .into_iter()
            .map(|enrollment| names.student_view(enrollment))
            .collect()
    }

    pub fn list_for_course(
        &self,
        actor: &Actor,
        course: EntityId,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<CourseEnrollmentView>, ServiceError> {
        self.ensure_visible::<Course>(actor, course)?;

        let filter = EnrollmentFilter {
            course: Some(course.0),
            ..EnrollmentFilter::status(status)
        };
        let mut names = Names::new(self.repository.as_ref());
        self.visible_rows(actor, filter)?
            .into_iter()
            .map(|enrollment| names.course_view(enrollment))
            .collect()
    }

    /// Counts over the whole enrollment table, recomputed per call. Anonymous callers get zeros.
    pub fn stats(&self, actor: &Actor) -> Result<EnrollmentStats, ServiceError> {
        if matches!(actor, Actor::Anonymous) {
            return Ok(EnrollmentStats::default());
        }
        let rows = self.repository.list::<Enrollment>()?;
        Ok(EnrollmentStats::tally(&rows))
    }

    /// Validating save shared by every transition.
    fn save(&self, mut enrollment: Enrollment) -> Result<Enrollment, ServiceError> {
        self.ensure_no_active_duplicate(&enrollment)?;
        enrollment.last_updated = Utc::now();
        Ok(self.repository.update(enrollment)?)
    }

    fn ensure_no_active_duplicate(&self, enrollment: &Enrollment) -> Result<(), ServiceError> {
        if !enrollment.is_active() {
            return Ok(());
        }
        let taken = self
            .repository
            .list::<Enrollment>()?
            .iter()
            .any(|other| {
                other.id != enrollment.id && other.is_active() && other.same_pair(enrollment)
            });
        if taken {
            Err(ServiceError::DuplicateEnrollment)
        } else {
            Ok(())
        }
    }

    fn scope_of<T: Ownable>(&self, record: &T) -> Result<Scope, ServiceError> {
        Ok(ScopeResolver::new(self.repository.as_ref()).resolve(record.ownership())?)
    }

    fn visible(&self, actor: &Actor, id: EntityId) -> Result<(Enrollment, Scope), ServiceError> {
        let visibility = filter_visible(actor, ResourceKind::Enrollment);
        let enrollment = self
            .repository
            .fetch::<Enrollment>(id)?
            .ok_or(ServiceError::NotFound(ResourceKind::Enrollment))?;
        let scope = self.scope_of(&enrollment)?;
        if !visibility.admits(&scope) {
            return Err(ServiceError::NotFound(ResourceKind::Enrollment));
        }
        Ok((enrollment, scope))
    }

    fn ensure_visible<T>(&self, actor: &Actor, id: EntityId) -> Result<(), ServiceError>
    where
        T: Record + Ownable,
    {
        let record = self
            .repository
            .fetch::<T>(id)?
            .ok_or(ServiceError::NotFound(T::KIND))?;
        if filter_visible(actor, T::KIND).admits(&self.scope_of(&record)?) {
            Ok(())
        } else {
            Err(ServiceError::NotFound(T::KIND))
        }
    }

    fn visible_rows(
        &self,
        actor: &Actor,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, ServiceError> {
        let visibility = filter_visible(actor, ResourceKind::Enrollment);
        if visibility == Visibility::Nothing {
            return Ok(Vec::new());
        }

        let mut resolver = ScopeResolver::new(self.repository.as_ref());
        let mut rows = Vec::new();
        for enrollment in self.repository.list::<Enrollment>()? {
            if filter.matches(&enrollment)
                && visibility.admits(&resolver.resolve(enrollment.ownership())?)
            {
                rows.push(enrollment);
            }
        }
        rows.sort_by(|a, b| {
            b.enrollment_date
                .cmp(&a.enrollment_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    fn describe_one(&self, enrollment: Enrollment) -> Result<EnrollmentView, ServiceError> {
        Names::new(self.repository.as_ref()).enrollment_view(enrollment)
    }
}

fn clean_grade(grade: Option<String>) -> Result<Option<String>, FieldErrors> {
    let mut cleaned = None;
    let mut writer = FieldWriter::new(WriteMode::Patch);
    writer.optional_text("grade", grade, Some(MAX_GRADE_LEN), &mut cleaned);
    writer.finish()?;
    Ok(cleaned)
}

/// Memoized lookups used to denormalize enrollment rows.
struct Names<'a, R> {
    repository: &'a R,
    students: HashMap<EntityId, Option<Student>>,
    courses: HashMap<EntityId, Option<Course>>,
    departments: HashMap<EntityId, Option<Department>>,
}

impl<'a, R> Names<'a, R>
where
    R: SchoolRepository,
{
    fn new(repository: &'a R) -> Self {
        Self {
            repository,
            students: HashMap::new(),
            courses: HashMap::new(),
            departments: HashMap::new(),
        }
    }

    fn student(&mut self, id: EntityId) -> Result<Student, ServiceError> {
        if !self.students.contains_key(&id) {
            let student = self.repository.fetch::<Student>(id)?;
            self.students.insert(id, student);
        }
        Ok(self.students.get(&id).cloned().flatten().unwrap_or_default())
    }

    fn course(&mut self, id: EntityId) -> Result<Course, ServiceError> {
        if !self.courses.contains_key(&id) {
            let course = self.repository.fetch::<Course>(id)?;
            self.courses.insert(id, course);
        }
        Ok(self.courses.get(&id).cloned().flatten().unwrap_or_default())
    }

    fn department_name(&mut self, id: EntityId) -> Result<String, ServiceError> {
        if !self.departments.contains_key(&id) {
            let department = self.repository.fetch::<Department>(id)?;
            self.departments.insert(id, department);
        }
        Ok(self
            .departments
            .get(&id)
            .and_then(|department| department.as_ref())
            .map(|department| department.name.clone())
            .unwrap_or_default())
    }

    fn enrollment_view(&mut self, enrollment: Enrollment) -> Result<EnrollmentView, ServiceError> {
        let student = self.student(enrollment.student)?;
        let course = self.course(enrollment.course)?;
        let department_name = self.department_name(course.department_id)?;

        Ok(EnrollmentView {
            id: enrollment.id,
            student: enrollment.student,
            course: enrollment.course,
            student_name: student.first_name,
            student_last_name: student.last_name,
            student_id_number: student.student_id,
            course_name: course.name,
            course_code: course.code,
            department_name,
            status: enrollment.status,
            enrollment_date: enrollment.enrollment_date,
            last_updated: enrollment.last_updated,
            grade: enrollment.grade,
            notes: enrollment.notes,
        })
    }

    fn student_view(
        &mut self,
        enrollment: Enrollment,
    ) -> Result<StudentEnrollmentView, ServiceError> {
        let course = self.course(enrollment.course)?;
        let department_name = self.department_name(course.department_id)?;

        Ok(StudentEnrollmentView {
            id: enrollment.id,
            course: enrollment.course,
            course_name: course.name,
            course_code: course.code,
            course_description: course.description,
            department_name,
            status: enrollment.status,
            enrollment_date: enrollment.enrollment_date,
            grade: enrollment.grade,
        })
    }

    fn course_view(&mut self, enrollment: Enrollment) -> Result<CourseEnrollmentView, ServiceError> {
        let student = self.student(enrollment.student)?;

        Ok(CourseEnrollmentView {
            id: enrollment.id,
            student: enrollment.student,
            student_name: student.first_name,
            student_last_name: student.last_name,
            student_id_number: student.student_id,
            student_email: student.email,
            status: enrollment.status,
            enrollment_date: enrollment.enrollment_date,
            grade: enrollment.grade,
            notes: enrollment.notes,
        })
    }
}
