pub mod appointment;
pub mod dashboard;
pub mod evaluation;
pub mod inquiry;
pub mod patient;
pub mod provider;

pub use appointment::{
    Appointment, AppointmentPreset, AppointmentSortField, AppointmentStatus,
    CreateAppointmentRequest, UpdateAppointmentRequest,
};
pub use dashboard::{
    AlertSeverity, DashboardAlert, DashboardStats, DashboardSummary, DashboardTask, TaskPriority,
};
pub use evaluation::{
    CreateEvaluationRequest, Evaluation, EvaluationPreset, EvaluationSortField, EvaluationStatus,
    UpdateEvaluationRequest,
};
pub use inquiry::{
    ContactAttempt, ContactAttempts, ContactMethod, CreateInquiryRequest, Inquiry, InquiryPreset,
    InquirySortField, InquiryStatus, LogContactAttemptRequest, UpdateInquiryRequest, Urgency,
};
pub use patient::{
    CreatePatientRequest, Patient, PatientDocument, PatientPreset, PatientSortField,
    PatientStatus, UpdatePatientRequest,
};
pub use provider::Provider;
