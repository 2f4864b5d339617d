use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::access::{Ownable, Ownership, ResourceKind};

use super::domain::{
    College, CollegeInput, Course, CourseInput, Department, DepartmentInput, EntityId,
    Professor, ProfessorInput, ProfileInput, Student, StudentInput, Subject, SubjectInput, User,
    UserInput,
};
use super::repository::{Record, Reference, UniqueKey};
use super::validation::{FieldErrors, FieldWriter, WriteMode};

pub const COURSE_CODE: &str = "course_code";
pub const SUBJECT_CODE: &str = "subject_code";
pub const STUDENT_NUMBER: &str = "student_student_id";
pub const USERNAME: &str = "user_username";
pub const USER_EMPLOYEE_ID: &str = "user_employee_id";
pub const USER_STUDENT_ID: &str = "user_student_id";

/// A record exposed through the generic CRUD endpoints.
pub trait Resource: Record + Ownable + Serialize + Default + std::fmt::Debug {
    type Input: DeserializeOwned + Send + 'static;

    /// Path segment under `/api/v1`.
    const COLLECTION: &'static str;

    /// Copy payload fields onto the record, validating as it goes.
    fn apply(&mut self, input: Self::Input, mode: WriteMode) -> Result<(), FieldErrors>;

    fn touch(&mut self, _now: DateTime<Utc>, _created: bool) {}
}

macro_rules! record_id {
    () => {
        fn id(&self) -> EntityId {
            self.id
        }

        fn assign_id(&mut self, id: EntityId) {
            self.id = id;
        }
    };
}

macro_rules! timestamps {
    () => {
        fn touch(&mut self, now: DateTime<Utc>, created: bool) {
            if created {
                self.date_created = now;
            }
            self.date_updated = now;
        }
    };
}

impl Record for College {
    const KIND: ResourceKind = ResourceKind::College;
    record_id!();
}

impl Ownable for College {
    fn ownership(&self) -> Ownership {
        Ownership::College(self.id)
    }
}

impl Resource for College {
    type Input = CollegeInput;
    const COLLECTION: &'static str = "colleges";

    fn apply(&mut self, input: CollegeInput, mode: WriteMode) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(mode);
        writer.required_text("name", input.name, 255, &mut self.name);
        writer.optional_text("address", input.address, None, &mut self.address);
        writer.optional_text(
            "contact_number",
            input.contact_number,
            Some(15),
            &mut self.contact_number,
        );
        writer.finish()
    }

    timestamps!();
}

impl Record for Department {
    const KIND: ResourceKind = ResourceKind::Department;
    record_id!();

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "college_id",
            ResourceKind::College,
            self.college_id,
        )]
    }
}

impl Ownable for Department {
    fn ownership(&self) -> Ownership {
        Ownership::Department {
            department: self.id,
            college: self.college_id,
        }
    }
}

impl Resource for Department {
    type Input = DepartmentInput;
    const COLLECTION: &'static str = "departments";

    fn apply(&mut self, input: DepartmentInput, mode: WriteMode) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(mode);
        writer.required_reference("college_id", input.college_id, &mut self.college_id);
        writer.required_text("name", input.name, 255, &mut self.name);
        writer.optional_text("description", input.description, None, &mut self.description);
        writer.finish()
    }

    timestamps!();
}

impl Record for Course {
    const KIND: ResourceKind = ResourceKind::Course;
    record_id!();

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "department_id",
            ResourceKind::Department,
            self.department_id,
        )]
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(COURSE_CODE, self.code.clone())]
    }
}

impl Ownable for Course {
    fn ownership(&self) -> Ownership {
        Ownership::InDepartment(self.department_id)
    }
}

impl Resource for Course {
    type Input = CourseInput;
    const COLLECTION: &'static str = "courses";

    fn apply(&mut self, input: CourseInput, mode: WriteMode) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(mode);
        writer.required_reference("department_id", input.department_id, &mut self.department_id);
        writer.required_text("name", input.name, 255, &mut self.name);
        writer.required_text("code", input.code, 20, &mut self.code);
        writer.optional_text("description", input.description, None, &mut self.description);
        writer.finish()
    }

    timestamps!();
}

impl Record for Subject {
    const KIND: ResourceKind = ResourceKind::Subject;
    record_id!();

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "course_id",
            ResourceKind::Course,
            self.course_id,
        )]
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(SUBJECT_CODE, self.code.clone())]
    }
}

impl Ownable for Subject {
    fn ownership(&self) -> Ownership {
        Ownership::InCourse(self.course_id)
    }
}

impl Resource for Subject {
    type Input = SubjectInput;
    const COLLECTION: &'static str = "subjects";

    fn apply(&mut self, input: SubjectInput, mode: WriteMode) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(mode);
        writer.required_reference("course_id", input.course_id, &mut self.course_id);
        writer.required_text("name", input.name, 255, &mut self.name);
        writer.required_text("code", input.code, 20, &mut self.code);
        writer.required_text("description", input.description, usize::MAX, &mut self.description);
        writer.finish()
    }
}

impl Record for Student {
    const KIND: ResourceKind = ResourceKind::Student;
    record_id!();

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "department_id",
            ResourceKind::Department,
            self.department_id,
        )]
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(STUDENT_NUMBER, self.student_id.clone())]
    }
}

impl Ownable for Student {
    fn ownership(&self) -> Ownership {
        Ownership::InDepartment(self.department_id)
    }
}

impl Resource for Student {
    type Input = StudentInput;
    const COLLECTION: &'static str = "students";

    fn apply(&mut self, input: StudentInput, mode: WriteMode) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(mode);
        writer.required_reference("department_id", input.department_id, &mut self.department_id);
        writer.required_text("first_name", input.first_name, 100, &mut self.first_name);
        writer.required_text("last_name", input.last_name, 100, &mut self.last_name);
        writer.required_text("student_id", input.student_id, 15, &mut self.student_id);
        writer.required_email("email", input.email, &mut self.email);
        writer.required_text(
            "contact_number",
            input.contact_number,
            15,
            &mut self.contact_number,
        );
        writer.finish()
    }
}

impl Record for Professor {
    const KIND: ResourceKind = ResourceKind::Professor;
    record_id!();

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "department_id",
            ResourceKind::Department,
            self.department_id,
        )]
    }
}

impl Ownable for Professor {
    fn ownership(&self) -> Ownership {
        Ownership::InDepartment(self.department_id)
    }
}

impl Resource for Professor {
    type Input = ProfessorInput;
    const COLLECTION: &'static str = "professors";

    fn apply(&mut self, input: ProfessorInput, mode: WriteMode) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(mode);
        writer.required_reference("department_id", input.department_id, &mut self.department_id);
        writer.required_text("first_name", input.first_name, 100, &mut self.first_name);
        writer.required_text("last_name", input.last_name, 100, &mut self.last_name);
        writer.required_text(
            "specialization",
            input.specialization,
            255,
            &mut self.specialization,
        );
        writer.required_text(
            "contact_number",
            input.contact_number,
            15,
            &mut self.contact_number,
        );
        writer.finish()
    }
}

impl Record for User {
    const KIND: ResourceKind = ResourceKind::User;
    record_id!();

    fn references(&self) -> Vec<Reference> {
        let college = self
            .college_id
            .map(|id| Reference::new("college_id", ResourceKind::College, id));
        let department = self
            .department_id
            .map(|id| Reference::new("department_id", ResourceKind::Department, id));
        college.into_iter().chain(department).collect()
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::new(USERNAME, self.username.clone())];
        if let Some(employee_id) = &self.employee_id {
            keys.push(UniqueKey::new(USER_EMPLOYEE_ID, employee_id.clone()));
        }
        if let Some(student_id) = &self.student_id {
            keys.push(UniqueKey::new(USER_STUDENT_ID, student_id.clone()));
        }
        keys
    }
}

impl Ownable for User {
    fn ownership(&self) -> Ownership {
        Ownership::Account {
            user: self.id,
            college: self.college_id,
            department: self.department_id,
        }
    }
}

impl Resource for User {
    type Input = UserInput;
    const COLLECTION: &'static str = "users";

    fn apply(&mut self, input: UserInput, mode: WriteMode) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(mode);
        writer.required_text("username", input.username, 150, &mut self.username);
        writer.optional_email("email", input.email, &mut self.email);
        writer.plain_text("first_name", input.first_name, 150, &mut self.first_name);
        writer.plain_text("last_name", input.last_name, 150, &mut self.last_name);
        writer.set(input.role, &mut self.role);
        writer.optional_text("phone", input.phone, Some(15), &mut self.phone);
        writer.set(input.college_id.map(Some), &mut self.college_id);
        writer.set(input.department_id.map(Some), &mut self.department_id);
        writer.optional_text("employee_id", input.employee_id, Some(20), &mut self.employee_id);
        writer.optional_text("student_id", input.student_id, Some(20), &mut self.student_id);
        writer.set(input.date_of_birth.map(Some), &mut self.date_of_birth);
        writer.optional_text("address", input.address, None, &mut self.address);
        writer.set(input.is_active, &mut self.is_active);
        writer.finish()
    }

    timestamps!();
}

impl User {
    /// Self-service edit; affiliation, role and identifiers stay untouched.
    pub fn apply_profile(&mut self, input: ProfileInput) -> Result<(), FieldErrors> {
        let mut writer = FieldWriter::new(WriteMode::Patch);
        writer.optional_email("email", input.email, &mut self.email);
        writer.plain_text("first_name", input.first_name, 150, &mut self.first_name);
        writer.plain_text("last_name", input.last_name, 150, &mut self.last_name);
        writer.optional_text("phone", input.phone, Some(15), &mut self.phone);
        writer.set(input.date_of_birth.map(Some), &mut self.date_of_birth);
        writer.optional_text("address", input.address, None, &mut self.address);
        writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;

    #[test]
    fn course_payload_is_validated_as_a_whole() {
        let mut course = Course::default();
        let errors = course
            .apply(
                CourseInput {
                    name: Some("   ".to_string()),
                    code: Some("X".repeat(25)),
                    ..CourseInput::default()
                },
                WriteMode::Create,
            )
            .expect_err("invalid course");

        assert!(errors.contains("department_id"));
        assert!(errors.contains("name"));
        assert!(errors.contains("code"));
    }

    #[test]
    fn user_references_only_present_affiliations() {
        let user = User {
            username: "dean".to_string(),
            department_id: Some(EntityId(4)),
            employee_id: Some("EMP-1".to_string()),
            ..User::default()
        };

        assert_eq!(
            user.references(),
            vec![Reference::new(
                "department_id",
                ResourceKind::Department,
                EntityId(4)
            )]
        );
        let constraints: Vec<_> = user.unique_keys().iter().map(|key| key.constraint).collect();
        assert_eq!(constraints, vec![USERNAME, USER_EMPLOYEE_ID]);
    }

    #[test]
    fn profile_edit_cannot_touch_role_or_affiliation() {
        let mut user = User {
            username: "teacher".to_string(),
            role: Role::Teacher,
            college_id: Some(EntityId(1)),
            ..User::default()
        };

        user.apply_profile(ProfileInput {
            first_name: Some("Ada".to_string()),
            phone: Some("555-0100".to_string()),
            ..ProfileInput::default()
        })
        .expect("valid profile");

        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.phone.as_deref(), Some("555-0100"));
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.college_id, Some(EntityId(1)));
    }

    #[test]
    fn collection_ownership_shapes() {
        let department = Department {
            id: EntityId(3),
            college_id: EntityId(1),
            ..Department::default()
        };
        let subject = Subject {
            course_id: EntityId(8),
            ..Subject::default()
        };

        assert_eq!(
            department.ownership(),
            Ownership::Department {
                department: EntityId(3),
                college: EntityId(1)
            }
        );
        assert_eq!(subject.ownership(), Ownership::InCourse(EntityId(8)));
    }
}
