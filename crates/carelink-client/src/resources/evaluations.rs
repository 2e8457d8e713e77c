use carelink_core::models::{CreateEvaluationRequest, Evaluation, UpdateEvaluationRequest};

use crate::collection::Resource;

impl Resource for Evaluation {
    type Create = CreateEvaluationRequest;
    type Update = UpdateEvaluationRequest;

    const PATH: &'static str = "/evaluations";
    const FIRST_PAGE: u32 = 1;
}
