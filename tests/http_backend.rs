use actix_multipart::Multipart;
use actix_web::{App, HttpResponse, HttpServer, web};
use futures_util::TryStreamExt;
use reqwest::Url;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use smartdeck::errors::{GatewayOperation, NoticeKind};
use smartdeck::services::{
    GenerateRequest, HttpBackend, PresentationBackend, PromptRequest, TransferProgress,
};
use smartdeck::{AnalysisSession, GatewayError, UploadedFile};

#[derive(Debug, Clone, PartialEq)]
struct FormPart {
    name: String,
    filename: Option<String>,
    data: Vec<u8>,
}

impl FormPart {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[derive(Default)]
struct Recorder {
    forms: Mutex<Vec<Vec<FormPart>>>,
}

impl Recorder {
    fn last(&self) -> Vec<FormPart> {
        self.forms.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

async fn read_form(mut payload: Multipart, recorder: &Recorder) -> Vec<FormPart> {
    let mut parts = Vec::new();
    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition.get_name().unwrap_or_default().to_string();
        let filename = content_disposition.get_filename().map(str::to_string);

        let mut data = Vec::new();
        while let Ok(Some(chunk)) = field.try_next().await {
            data.extend_from_slice(&chunk);
        }
        parts.push(FormPart { name, filename, data });
    }
    recorder.forms.lock().unwrap().push(parts.clone());
    parts
}

const DECK: &[u8] = b"PK\x03\x04 fake pptx payload";

async fn analyze(payload: Multipart, recorder: web::Data<Recorder>) -> HttpResponse {
    let parts = read_form(payload, &recorder).await;
    let filenames: Vec<_> = parts.iter().filter_map(|p| p.filename.clone()).collect();

    HttpResponse::Ok().json(serde_json::json!({
        "session_id": "abc",
        "session_token": "tok",
        "filenames": filenames,
        "summary": "Regional sales figures for Q4",
        "suggested_styles": [
            {"id": "sales", "name": "Sales & Commercial", "description": "Pitch",
             "icon": "trending-up", "match_score": 6, "reason": "Detected: sales, pipeline",
             "is_recommended": true},
            {"id": "executive", "name": "Executive Formal", "description": "Board",
             "icon": "briefcase", "match_score": 1, "reason": "Available style",
             "is_recommended": false}
        ],
        "text_preview": "region,total"
    }))
}

async fn generate(payload: Multipart, recorder: web::Data<Recorder>) -> HttpResponse {
    read_form(payload, &recorder).await;
    HttpResponse::Ok()
        .content_type("application/vnd.openxmlformats-officedocument.presentationml.presentation")
        .insert_header(("Content-Disposition", r#"attachment; filename="Q4_Report.pptx""#))
        .body(DECK)
}

async fn generate_without_header(
    payload: Multipart,
    recorder: web::Data<Recorder>,
) -> HttpResponse {
    read_form(payload, &recorder).await;
    HttpResponse::Ok().body(DECK)
}

async fn reject_prompt(payload: Multipart, recorder: web::Data<Recorder>) -> HttpResponse {
    read_form(payload, &recorder).await;
    HttpResponse::UnprocessableEntity().json(serde_json::json!({"detail": "prompt too vague"}))
}

async fn crash(payload: Multipart, recorder: web::Data<Recorder>) -> HttpResponse {
    read_form(payload, &recorder).await;
    HttpResponse::InternalServerError()
        .content_type("text/html")
        .body("<h1>Internal Server Error</h1>")
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "SmartDeck AI v2.0 - Intelligent Presentation Platform",
        "gemini_enabled": false,
        "version": "2.0.0"
    }))
}

fn happy_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/analyze", web::post().to(analyze))
        .route("/generate", web::post().to(generate))
        .route("/generate-from-prompt", web::post().to(generate_without_header));
}

fn failing_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/analyze", web::post().to(crash))
        .route("/generate", web::post().to(crash))
        .route("/generate-from-prompt", web::post().to(reject_prompt));
}

/// Starts a stub backend on an ephemeral port and returns a client for it.
fn spawn_backend(routes: fn(&mut web::ServiceConfig)) -> (HttpBackend, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let data = web::Data::from(recorder.clone());

    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    tokio::spawn(server.run());

    let url = Url::parse(&format!("http://{addr}")).unwrap();
    (HttpBackend::new(&url), recorder)
}

fn files() -> Vec<UploadedFile> {
    vec![
        UploadedFile::new("sales.xlsx", b"region,total".to_vec()),
        UploadedFile::new("notes.docx", b"pipeline notes".to_vec()),
    ]
}

fn no_progress(_: TransferProgress) {}

#[tokio::test(flavor = "multi_thread")]
async fn analyze_uploads_files_in_order() {
    let (backend, recorder) = spawn_backend(happy_routes);

    let session = backend.analyze(&files()).await.unwrap();

    assert_eq!(session.session_id, "abc");
    assert_eq!(session.session_token.as_deref(), Some("tok"));
    assert_eq!(session.summary, "Regional sales figures for Q4");
    assert_eq!(session.suggested_styles.len(), 2);
    assert!(session.suggested_styles[0].is_recommended());
    assert_eq!(session.filenames, ["sales.xlsx", "notes.docx"]);

    let form = recorder.last();
    assert!(form.iter().all(|p| p.name == "files"));
    assert_eq!(form[0].filename.as_deref(), Some("sales.xlsx"));
    assert_eq!(form[0].data, b"region,total");
    assert_eq!(form[1].filename.as_deref(), Some("notes.docx"));
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_with_session_omits_files() {
    let (backend, recorder) = spawn_backend(happy_routes);
    let session = AnalysisSession {
        session_id: "abc".into(),
        session_token: Some("tok".into()),
        summary: String::new(),
        suggested_styles: Vec::new(),
        filenames: Vec::new(),
        text_preview: None,
    };
    let request = GenerateRequest::new(Some(&session), &files(), "sales", "emerald_pro");

    let seen = Mutex::new(Vec::new());
    let progress = |p: TransferProgress| seen.lock().unwrap().push(p);
    let artifact = backend.generate(request, &progress).await.unwrap();

    assert_eq!(artifact.filename, "Q4_Report.pptx");
    assert_eq!(artifact.content.as_ref(), DECK);

    let seen = seen.into_inner().unwrap();
    let last = seen.last().unwrap();
    assert_eq!(last.loaded, DECK.len() as u64);
    assert_eq!(last.total, Some(DECK.len() as u64));

    let fields: Vec<_> = recorder
        .last()
        .into_iter()
        .map(|p| (p.name.clone(), p.text()))
        .collect();
    assert_eq!(
        fields,
        [
            ("session_id".to_string(), "abc".to_string()),
            ("session_token".to_string(), "tok".to_string()),
            ("theme".to_string(), "emerald_pro".to_string()),
            ("style".to_string(), "sales".to_string()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_without_session_resends_files() {
    let (backend, recorder) = spawn_backend(happy_routes);
    let request = GenerateRequest::new(None, &files(), "executive", "corporate_navy");

    backend.generate(request, &no_progress).await.unwrap();

    let form = recorder.last();
    let names: Vec<_> = form.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["files", "files", "theme", "style"]);
    assert_eq!(form[1].filename.as_deref(), Some("notes.docx"));
    assert_eq!(form[3].text(), "executive");
}

#[tokio::test(flavor = "multi_thread")]
async fn prompt_generation_defaults_filename_without_header() {
    let (backend, recorder) = spawn_backend(happy_routes);
    let request = PromptRequest {
        prompt: "Quarterly update for the whole team".into(),
        style: "informal".into(),
        theme: "monochrome_minimal".into(),
    };

    let artifact = backend.generate_from_prompt(request, &no_progress).await.unwrap();

    assert_eq!(artifact.filename, "SmartDeck_Prompt.pptx");
    let fields: Vec<_> = recorder.last().into_iter().map(|p| { let text = p.text(); (p.name, text) }).collect();
    assert_eq!(
        fields[0],
        ("prompt".to_string(), "Quarterly update for the whole team".to_string())
    );
    assert_eq!(fields[1], ("theme".to_string(), "monochrome_minimal".to_string()));
    assert_eq!(fields[2], ("style".to_string(), "informal".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn structured_rejection_carries_detail() {
    let (backend, _) = spawn_backend(failing_routes);
    let request = PromptRequest {
        prompt: "Make me some slides".into(),
        style: "executive".into(),
        theme: "corporate_navy".into(),
    };

    let err = backend.generate_from_prompt(request, &no_progress).await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::Server {
            status: 422,
            detail: Some("prompt too vague".into())
        }
    );
    assert_eq!(
        err.into_notice(GatewayOperation::GenerateFromPrompt).message,
        "prompt too vague"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unstructured_failure_has_no_detail() {
    let (backend, _) = spawn_backend(failing_routes);

    let err = backend.analyze(&files()).await.unwrap_err();

    assert_eq!(err, GatewayError::Server { status: 500, detail: None });
    let notice = err.into_notice(GatewayOperation::Analyze);
    assert_eq!(notice.kind, NoticeKind::Unknown);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_is_a_connectivity_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = HttpBackend::new(&Url::parse(&format!("http://{addr}")).unwrap());

    let err = backend.analyze(&files()).await.unwrap_err();

    assert!(matches!(err, GatewayError::Connectivity(_)), "got {err:?}");
    assert_eq!(
        err.into_notice(GatewayOperation::Analyze).kind,
        NoticeKind::Connectivity
    );
}

/// Reads one HTTP request off `socket`, headers and body.
async fn drain_request(socket: &mut tokio::net::TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        request.extend_from_slice(&buf[..n]);

        let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|len| len.trim().parse::<usize>().ok());
        let complete = match body_len {
            Some(len) => request.len() >= end + 4 + len,
            None => request.ends_with(b"0\r\n\r\n"),
        };
        if complete {
            return;
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn download_cut_short_is_a_connectivity_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        drain_request(&mut socket).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\nPK\x03\x04 partial")
            .await
            .unwrap();
        socket.flush().await.unwrap();
    });
    let backend = HttpBackend::new(&Url::parse(&format!("http://{addr}")).unwrap());
    let request = PromptRequest {
        prompt: "Quarterly update for the whole team".into(),
        style: "executive".into(),
        theme: "corporate_navy".into(),
    };

    let seen = Mutex::new(Vec::new());
    let progress = |p: TransferProgress| seen.lock().unwrap().push(p);
    let err = backend.generate_from_prompt(request, &progress).await.unwrap_err();

    assert!(matches!(err, GatewayError::Connectivity(_)), "got {err:?}");
    let notice = err.into_notice(GatewayOperation::GenerateFromPrompt);
    assert_eq!(notice.kind, NoticeKind::Connectivity);
    assert_eq!(notice.message, "Server disconnected.");
    assert!(seen.into_inner().unwrap().iter().all(|p| p.total == Some(1000)));
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_backend_health() {
    let (backend, _) = spawn_backend(happy_routes);

    let status = backend.status().await.unwrap();

    assert_eq!(status.status, "ok");
    assert_eq!(status.version.as_deref(), Some("2.0.0"));
    assert!(!status.gemini_enabled);
}
