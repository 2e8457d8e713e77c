use carelink_core::models::{
    CreateInquiryRequest, Inquiry, LogContactAttemptRequest, UpdateInquiryRequest,
};
use carelink_core::{ApiResult, Method};

use crate::collection::{Resource, SyncCollection};

impl Resource for Inquiry {
    type Create = CreateInquiryRequest;
    type Update = UpdateInquiryRequest;

    const PATH: &'static str = "/inquiries";
    const FIRST_PAGE: u32 = 1;
}

impl SyncCollection<Inquiry> {
    /// Record an outreach attempt and take the server's updated inquiry.
    pub async fn log_contact_attempt(
        &self,
        id: &str,
        attempt: &LogContactAttemptRequest,
    ) -> ApiResult<Inquiry> {
        let path = format!("{}/contact-attempts", self.endpoint().item_path(id));
        self.write_through(Method::Post, &path, attempt).await
    }
}
