use clap::Args;
use schoolmgmt::directory::InMemorySchoolRepository;
use schoolmgmt::enrollment::{
    EnrollmentFilter, EnrollmentRequest, EnrollmentService, EnrollmentStatus,
    EnrollmentUniqueness, EnrollmentView,
};
use schoolmgmt::seed::{ensure_admin, populate, SeedPlan};
use schoolmgmt::AppError;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of colleges to generate
    #[arg(long, default_value_t = 3)]
    pub(crate) colleges: usize,
    /// Departments created in each college
    #[arg(long, default_value_t = 4)]
    pub(crate) departments_per_college: usize,
    /// Courses created in each department
    #[arg(long, default_value_t = 6)]
    pub(crate) courses_per_department: usize,
    /// Number of students to generate
    #[arg(long, default_value_t = 50)]
    pub(crate) students: usize,
    /// Upper bound on enrollments per student
    #[arg(long, default_value_t = 5)]
    pub(crate) max_enrollments: usize,
    /// Keep one enrollment row per student/course pair, so re-enrolling after a drop fails
    #[arg(long)]
    pub(crate) strict_pairs: bool,
}

impl DemoArgs {
    fn plan(&self) -> SeedPlan {
        SeedPlan {
            colleges: self.colleges,
            departments_per_college: self.departments_per_college,
            courses_per_department: self.courses_per_department,
            students: self.students,
            max_enrollments_per_student: self.max_enrollments,
        }
    }

    fn uniqueness(&self) -> EnrollmentUniqueness {
        if self.strict_pairs {
            EnrollmentUniqueness::StudentCourse
        } else {
            EnrollmentUniqueness::ActiveOnly
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let uniqueness = args.uniqueness();
    let repository = Arc::new(InMemorySchoolRepository::for_enrollment_uniqueness(
        uniqueness,
    ));
    let summary = populate(repository.as_ref(), &args.plan())?;
    let admin = ensure_admin(repository.as_ref(), "admin")?;

    println!("=== Sample school (uniqueness: {}) ===", uniqueness.label());
    println!("{summary}");
    println!();

    let service = EnrollmentService::new(repository);
    let actor = service.authenticate(Some(admin.id))?;
    let active = service.list(&actor, EnrollmentFilter::status(Some(EnrollmentStatus::Enrolled)))?;
    let Some(sample) = active.into_iter().last() else {
        println!("No active enrollments to walk through.");
        return Ok(());
    };

    println!("=== Enrollment lifecycle ===");
    print_step("Enrolled", &sample);

    let dropped = service.drop_enrollment(&actor, sample.id)?;
    print_step("Dropped", &dropped);

    let request = EnrollmentRequest {
        student: Some(sample.student),
        course: Some(sample.course),
        notes: Some("Re-enrolled during the CLI demo.".to_string()),
    };
    match service.enroll(&actor, request) {
        Ok(again) => {
            print_step("Re-enrolled", &again);
            let completed = service.complete_enrollment(&actor, again.id, Some("A".to_string()))?;
            print_step("Completed", &completed);
        }
        Err(err) => println!("  Re-enrollment rejected: {err}"),
    }

    let stats = service.stats(&actor)?;
    println!();
    println!("=== Enrollment statistics ===");
    println!("Total: {}", stats.total);
    println!("  Active: {}", stats.active);
    println!("  Completed: {}", stats.completed);
    println!("  Dropped: {}", stats.dropped);
    Ok(())
}

fn print_step(label: &str, view: &EnrollmentView) {
    println!(
        "  {label:<12} #{} {} {} ({}) in {} {} [{}{}]",
        view.id,
        view.student_name,
        view.student_last_name,
        view.student_id_number,
        view.course_code,
        view.course_name,
        view.status.label(),
        view.grade
            .as_deref()
            .map(|grade| format!(", grade {grade}"))
            .unwrap_or_default(),
    );
}
