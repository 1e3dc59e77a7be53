pub mod application;
pub mod job;
pub mod profile;

pub use application::{Application, ApplicationStatus, RecruiterProfile, SavedJob};
pub use job::{EmploymentType, Job, JobVisibility, NewJob, WorkMode};
pub use profile::{
    AccomplishmentEntry, AccomplishmentKind, CandidateProfile, ChildEntry, ChildKind, ChildRow,
    EducationEntry, EducationLevel, EmploymentEntry, ExamEntry, InternshipEntry, LanguageEntry,
    ProjectEntry, WorkStatus,
};
