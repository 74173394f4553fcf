use std::net::SocketAddr;

use payment_wizard::config::PortalConfig;
use payment_wizard::errors::PortalError;
use payment_wizard::model::{BankAccountInfo, FormModel};
use payment_wizard::services::{
    AccountDeleter, HttpAccountDeleter, HttpPaymentSubmitter, PaymentSubmitter,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves one canned response and hands back the raw request it received.
async fn one_shot_server(status: &'static str, body: &'static str) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });
    (addr, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
        let text = String::from_utf8_lossy(&data);
        if let Some(split) = text.find("\r\n\r\n") {
            let length = text[..split]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= split + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

fn config_for(addr: SocketAddr) -> PortalConfig {
    PortalConfig {
        base_url: format!("http://{addr}"),
        request_timeout_secs: 5,
        ..PortalConfig::default()
    }
}

fn model() -> FormModel {
    FormModel {
        submission_id: 77,
        terms_accepted: true,
        ..FormModel::default()
    }
}

#[tokio::test]
async fn accepted_payment_returns_server_model() {
    let (addr, server) = one_shot_server(
        "200 OK",
        r#"{"success":true,"jsonModel":"{\"SubmissionId\":77,\"TransactionId\":\"TX-9\",\"TermsAccepted\":true}"}"#,
    )
    .await;
    let submitter = HttpPaymentSubmitter::new(&config_for(addr)).unwrap();

    let result = submitter.save(&model()).await.unwrap();
    assert!(result.success);
    let updated = result.updated_model.unwrap();
    assert_eq!(updated.transaction_id.as_deref(), Some("TX-9"));
    assert!(updated.extra.get("JsonModel").is_some());

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/PolicyHolder/FinishPayment"));
    assert!(request.contains("\"SubmissionId\":77"));
}

#[tokio::test]
async fn falsy_body_is_a_rejection() {
    let (addr, _server) = one_shot_server("200 OK", "false").await;
    let submitter = HttpPaymentSubmitter::new(&config_for(addr)).unwrap();
    let result = submitter.save(&model()).await.unwrap();
    assert!(!result.success);
    assert!(result.updated_model.is_none());
}

#[tokio::test]
async fn server_error_status_is_a_rejection() {
    let (addr, _server) = one_shot_server("500 Internal Server Error", "{}").await;
    let submitter = HttpPaymentSubmitter::new(&config_for(addr)).unwrap();
    assert!(!submitter.save(&model()).await.unwrap().success);
}

#[tokio::test]
async fn missing_json_model_is_an_error() {
    let (addr, _server) = one_shot_server("200 OK", r#"{"success":true}"#).await;
    let submitter = HttpPaymentSubmitter::new(&config_for(addr)).unwrap();
    let err = submitter.save(&model()).await.unwrap_err();
    assert!(matches!(err, PortalError::Submission(_)));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn unreachable_portal_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let submitter = HttpPaymentSubmitter::new(&config_for(addr)).unwrap();
    let err = submitter.save(&model()).await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn deleter_posts_account_and_reads_truthiness() {
    let (addr, server) = one_shot_server("200 OK", "true").await;
    let deleter = HttpAccountDeleter::new(&config_for(addr)).unwrap();
    let account = BankAccountInfo {
        bank_account_info_id: 5,
        bank_account_name: "Main".into(),
        ..BankAccountInfo::default()
    };

    assert!(deleter.delete(&account).await.unwrap());
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/PolicyHolder/RemoveBankAccount"));
    assert!(request.contains("\"BankAccountInfoId\":5"));

    let (addr, _server) = one_shot_server("200 OK", "0").await;
    let deleter = HttpAccountDeleter::new(&config_for(addr)).unwrap();
    assert!(!deleter.delete(&account).await.unwrap());
}
