use carelink_core::models::{Appointment, CreateAppointmentRequest, UpdateAppointmentRequest};

use crate::collection::Resource;

impl Resource for Appointment {
    type Create = CreateAppointmentRequest;
    type Update = UpdateAppointmentRequest;

    const PATH: &'static str = "/appointments";
    // The scheduling service counts pages from zero.
    const FIRST_PAGE: u32 = 0;
}
