//! Deterministic sample data and the startup admin account.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::access::Role;
use crate::directory::domain::{College, Course, Department, EntityId, Student, User};
use crate::directory::repository::{RepositoryError, SchoolRepository};
use crate::directory::resource::Resource;
use crate::enrollment::domain::{Enrollment, EnrollmentStats, EnrollmentStatus};

const COLLEGE_STEMS: [&str; 6] = [
    "Northfield",
    "Lakeshore",
    "Riverbend",
    "Summit Ridge",
    "Westbrook",
    "Harborview",
];
const COLLEGE_SUFFIXES: [&str; 3] = ["University", "College", "Institute"];

const DEPARTMENTS: [(&str, &str); 20] = [
    ("Computer Science", "CS"),
    ("Mathematics", "MATH"),
    ("Physics", "PHYS"),
    ("Chemistry", "CHEM"),
    ("Biology", "BIO"),
    ("Electrical Engineering", "EE"),
    ("Mechanical Engineering", "ME"),
    ("Civil Engineering", "CE"),
    ("Business Administration", "BUS"),
    ("Economics", "ECON"),
    ("Psychology", "PSY"),
    ("Sociology", "SOC"),
    ("English Literature", "ENG"),
    ("History", "HIST"),
    ("Philosophy", "PHIL"),
    ("Art & Design", "ART"),
    ("Music", "MUS"),
    ("Theater Arts", "THEA"),
    ("Political Science", "POLS"),
    ("Environmental Science", "ENV"),
];

const COURSE_TOPICS: [&str; 6] = [
    "Introduction to",
    "Foundations of",
    "Topics in",
    "Advanced",
    "Seminar in",
    "Research Methods in",
];

const FIRST_NAMES: [&str; 10] = [
    "Amara", "Ben", "Chloe", "Dmitri", "Elena", "Farid", "Grace", "Hiro", "Isla", "Jonah",
];
const LAST_NAMES: [&str; 9] = [
    "Okafor", "Lindqvist", "Moreau", "Patel", "Novak", "Reyes", "Tanaka", "Walsh", "Zhang",
];
const ENROLLMENT_YEARS: [i32; 4] = [2021, 2022, 2023, 2024];

/// Twenty-slot cycle approximating a 60/25/10/5 status mix.
const STATUS_CYCLE: [EnrollmentStatus; 20] = {
    use EnrollmentStatus::{Completed as C, Dropped as D, Enrolled as E, Withdrawn as W};
    [E, E, C, E, E, D, E, C, E, E, C, E, E, W, E, C, E, D, E, C]
};
const GRADES: [&str; 12] = [
    "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "F",
];

/// Shape of the generated data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub colleges: usize,
    pub departments_per_college: usize,
    pub courses_per_department: usize,
    pub students: usize,
    pub max_enrollments_per_student: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            colleges: 3,
            departments_per_college: 4,
            courses_per_department: 6,
            students: 50,
            max_enrollments_per_student: 5,
        }
    }
}

/// Counts of what a seeding run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub colleges: usize,
    pub departments: usize,
    pub courses: usize,
    pub students: usize,
    pub enrollments: EnrollmentStats,
    pub graded: usize,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Colleges: {}", self.colleges)?;
        writeln!(f, "Departments: {}", self.departments)?;
        writeln!(f, "Courses: {}", self.courses)?;
        writeln!(f, "Students: {}", self.students)?;
        writeln!(f, "Total enrollments: {}", self.enrollments.total)?;
        writeln!(f, "  Enrolled: {}", self.enrollments.active)?;
        writeln!(f, "  Completed: {}", self.enrollments.completed)?;
        writeln!(f, "  Dropped: {}", self.enrollments.dropped)?;
        write!(f, "Completed with grades: {}", self.graded)
    }
}

/// Make sure an active admin account named `username` exists.
pub fn ensure_admin<R>(repository: &R, username: &str) -> Result<User, RepositoryError>
where
    R: SchoolRepository,
{
    if let Some(existing) = repository
        .list::<User>()?
        .into_iter()
        .find(|user| user.username == username)
    {
        return Ok(existing);
    }

    let mut admin = User {
        username: username.to_string(),
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        role: Role::Admin,
        ..User::default()
    };
    admin.touch(Utc::now(), true);
    let admin = repository.insert(admin)?;
    info!(user = %admin.id, username, "bootstrap admin created");
    Ok(admin)
}

/// Write a deterministic college/department/course/student/enrollment data set.
pub fn populate<R>(repository: &R, plan: &SeedPlan) -> Result<SeedSummary, RepositoryError>
where
    R: SchoolRepository,
{
    let now = Utc::now();
    let mut summary = SeedSummary::default();
    let departments_per_college = plan.departments_per_college.min(DEPARTMENTS.len());

    let mut departments: Vec<(Department, &str)> = Vec::new();
    for index in 0..plan.colleges {
        let mut college = College {
            name: format!(
                "{} {}",
                COLLEGE_STEMS[index % COLLEGE_STEMS.len()],
                COLLEGE_SUFFIXES[index % COLLEGE_SUFFIXES.len()]
            ),
            address: Some(format!("{} University Avenue", 100 + index * 10)),
            contact_number: Some(format!("555-{:04}", 1000 + index)),
            ..College::default()
        };
        college.touch(now, true);
        let college = repository.insert(college)?;
        summary.colleges += 1;

        for offset in 0..departments_per_college {
            let slot = (index * departments_per_college + offset) % DEPARTMENTS.len();
            let (name, prefix) = DEPARTMENTS[slot];
            let mut department = Department {
                college_id: college.id,
                name: name.to_string(),
                description: Some(format!("Department of {name} at {}", college.name)),
                ..Department::default()
            };
            department.touch(now, true);
            departments.push((repository.insert(department)?, prefix));
            summary.departments += 1;
        }
    }

    let mut courses: Vec<Course> = Vec::new();
    for (department, prefix) in &departments {
        for offset in 0..plan.courses_per_department {
            let mut course = Course {
                department_id: department.id,
                name: format!(
                    "{} {}",
                    COURSE_TOPICS[offset % COURSE_TOPICS.len()],
                    department.name
                ),
                code: format!("{prefix}{}", 100 + courses.len()),
                description: Some(format!("Offered by the {} department.", department.name)),
                ..Course::default()
            };
            course.touch(now, true);
            courses.push(repository.insert(course)?);
            summary.courses += 1;
        }
    }

    if departments.is_empty() {
        return Ok(summary);
    }

    let mut enrollments = Vec::new();
    let mut cycle = 0usize;
    for index in 0..plan.students {
        let (department, _) = &departments[(index * 3) % departments.len()];
        let first = FIRST_NAMES[index % FIRST_NAMES.len()];
        let last = LAST_NAMES[(index * 4) % LAST_NAMES.len()];
        let code: String = department
            .name
            .chars()
            .filter(char::is_ascii_alphabetic)
            .take(3)
            .collect::<String>()
            .to_ascii_uppercase();
        let student = repository.insert(Student {
            department_id: department.id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            student_id: format!(
                "{code}{}{:03}",
                ENROLLMENT_YEARS[index % ENROLLMENT_YEARS.len()],
                index + 1
            ),
            email: format!(
                "{}.{}{}@students.example.edu",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase(),
                index + 1
            ),
            contact_number: format!("555-{:04}", 2000 + index),
            ..Student::default()
        })?;
        summary.students += 1;

        for course in pick_courses(&courses, department.id, index, plan.max_enrollments_per_student)
        {
            let status = STATUS_CYCLE[cycle % STATUS_CYCLE.len()];
            let grade = (status == EnrollmentStatus::Completed)
                .then(|| GRADES[cycle % GRADES.len()].to_string());
            let notes = (cycle % 3 == 0).then(|| format!("Placed via advising session {cycle}."));
            cycle += 1;

            let stored = repository.insert(Enrollment {
                student: student.id,
                course,
                status,
                grade,
                notes,
                enrollment_date: now,
                last_updated: now,
                ..Enrollment::default()
            })?;
            enrollments.push(stored);
        }
    }

    summary.enrollments = EnrollmentStats::tally(&enrollments);
    summary.graded = enrollments
        .iter()
        .filter(|row| row.status == EnrollmentStatus::Completed && row.grade.is_some())
        .count();
    info!(
        colleges = summary.colleges,
        courses = summary.courses,
        students = summary.students,
        enrollments = summary.enrollments.total,
        "sample data populated"
    );
    Ok(summary)
}

/// Mostly courses from the student's own department, the rest from elsewhere, no repeats.
fn pick_courses(
    courses: &[Course],
    department: EntityId,
    student_index: usize,
    max_enrollments: usize,
) -> Vec<EntityId> {
    let (own, other): (Vec<&Course>, Vec<&Course>) = courses
        .iter()
        .partition(|course| course.department_id == department);
    let wanted = 1 + student_index % max_enrollments.max(1);

    let mut picked = BTreeSet::new();
    for attempt in 0..wanted * 2 {
        if picked.len() == wanted {
            break;
        }
        let pool = if (attempt % 10 < 7 && !own.is_empty()) || other.is_empty() {
            &own
        } else {
            &other
        };
        if let Some(course) = pool.get((student_index + attempt * 7) % pool.len().max(1)) {
            picked.insert(course.id);
        }
    }
    picked.into_iter().collect()
}
