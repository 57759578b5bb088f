//! A fake portal for front-end tests: every login succeeds, door `123`
//! unlocks, door `999` is refused.

use aptus_protocol::{Credentials, Door, Endpoints, Secrets, WidgetEnvelope};
use aptus_session::SessionConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

struct Widgets {
    aptus_url: String,
}

impl Respond for Widgets {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let callback = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "callback")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let json = serde_json::json!({
            "data": { "aptuslogin@APTUSPORT": { "objekt": [{ "aptusUrl": self.aptus_url }] } }
        });
        ResponseTemplate::new(200).set_body_string(WidgetEnvelope::wrap(&callback, &json.to_string()))
    }
}

pub async fn portal() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-login.php"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "Fast2User_ssoId=1; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/widgets/"))
        .respond_with(Widgets {
            aptus_url: format!("{}/aptus/login", server.uri()),
        })
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/aptus/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/AptusPortal/Lock/UnlockEntryDoor/123"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/AptusPortal/Lock/UnlockEntryDoor/999"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    server
}

pub fn secrets() -> Secrets {
    Secrets::new(
        Credentials::new("tenant", "hunter2"),
        vec![
            Door::new("front-door", "123"),
            Door::new("garage", "999"),
            Door::new("laundry", "201"),
            Door::new("laundry", "202"),
        ],
    )
}

pub fn config(server: &MockServer) -> SessionConfig {
    SessionConfig {
        endpoints: Endpoints::new(&server.uri(), &server.uri()).unwrap(),
        ..SessionConfig::default()
    }
}
