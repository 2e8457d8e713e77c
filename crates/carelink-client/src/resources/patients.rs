use carelink_core::models::{CreatePatientRequest, Patient, UpdatePatientRequest};

use crate::collection::{Resource, path_segment};

impl Resource for Patient {
    type Create = CreatePatientRequest;
    type Update = UpdatePatientRequest;

    const PATH: &'static str = "/patients";
    const FIRST_PAGE: u32 = 1;
}

/// Chart documents of one patient.
pub fn documents_path(patient_id: &str) -> String {
    format!("{}/{}/documents", Patient::PATH, path_segment(patient_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_path_encodes_id() {
        assert_eq!(documents_path("p-1"), "/patients/p-1/documents");
        assert_eq!(documents_path("p/../x?y"), "/patients/p%2F..%2Fx%3Fy/documents");
    }
}
