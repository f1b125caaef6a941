use poem_openapi::{OpenApi, payload::PlainText};

use crate::presentation::http::endpoints::root::{Endpoints, EndpointsTags};

#[OpenApi]
impl Endpoints {
    /// Liveness probe. Does not touch storage or the dispatch loop.
    #[oai(path = "/health", method = "get", tag = EndpointsTags::Health)]
    pub async fn health(&self) -> PlainText<&'static str> {
        PlainText("OK")
    }
}

#[cfg(test)]
mod tests {
    use poem::test::TestClient;

    use crate::presentation::http::tests::test_app;

    #[tokio::test]
    async fn health_answers_ok() {
        let (app, _) = test_app();
        let resp = TestClient::new(app).get("/api/health").send().await;

        resp.assert_status_is_ok();
        resp.assert_text("OK").await;
    }
}
