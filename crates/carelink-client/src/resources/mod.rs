//! Per-entity wiring of the generic [`SyncCollection`].
//!
//! Each module binds a core record type to its endpoint and request bodies.

pub mod appointments;
pub mod evaluations;
pub mod inquiries;
pub mod patients;

use carelink_core::models::{Appointment, Evaluation, Inquiry, Patient};

use crate::collection::SyncCollection;

pub type PatientCollection = SyncCollection<Patient>;
pub type InquiryCollection = SyncCollection<Inquiry>;
pub type EvaluationCollection = SyncCollection<Evaluation>;
pub type AppointmentCollection = SyncCollection<Appointment>;
