// 该文件是 Wangshan （望山） 项目的一部分。
// src/predict.rs - 推理服务客户端
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::boxes::DetectionBox;

pub const BOXES_ENDPOINT: &str = "predict/boxes";
pub const VIDEO_ENDPOINT: &str = "predict/video";

/// 无法取得任何错误信息时展示的兜底文案
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

const FILE_FIELD: &str = "file";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// 视频在服务端逐帧推理并转码，给足时间
const VIDEO_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Error, Debug)]
pub enum PredictError {
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Unexpected status {status}: {}", detail.as_deref().unwrap_or("no detail"))]
  Status {
    status: StatusCode,
    detail: Option<String>,
  },
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// 服务端结构化错误响应体
#[derive(Debug, Deserialize)]
struct ErrorBody {
  detail: Option<String>,
}

fn error_detail(body: &str) -> Option<String> {
  serde_json::from_str::<ErrorBody>(body)
    .ok()
    .and_then(|e| e.detail)
}

/// 推理服务客户端，对应服务端的两个上传接口
pub struct PredictClient {
  http: Client,
  base: String,
}

impl PredictClient {
  pub fn new(base: &Url) -> Result<Self, PredictError> {
    let http = Client::builder()
      .connect_timeout(CONNECT_TIMEOUT)
      .timeout(REQUEST_TIMEOUT)
      .build()?;

    Ok(PredictClient {
      http,
      base: base.as_str().trim_end_matches('/').to_string(),
    })
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base, path)
  }

  fn file_part(path: &Path) -> Result<Part, PredictError> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| FILE_FIELD.to_string());
    let file = std::fs::File::open(path)?;
    let length = file.metadata()?.len();

    let part = Part::reader_with_length(file, length)
      .file_name(name)
      .mime_str(mime.essence_str())?;
    Ok(part)
  }

  /// 上传图片，返回检测框列表
  pub fn boxes(&self, file: &Path) -> Result<Vec<DetectionBox>, PredictError> {
    let url = self.endpoint(BOXES_ENDPOINT);
    debug!("POST {}: {}", url, file.display());

    let form = Form::new().part(FILE_FIELD, Self::file_part(file)?);
    let response = self.http.post(&url).multipart(form).send()?;
    Self::read_json(response)
  }

  /// 上传视频，返回处理后视频的地址
  pub fn video(&self, file: &Path) -> Result<String, PredictError> {
    let url = self.endpoint(VIDEO_ENDPOINT);
    debug!("POST {}: {}", url, file.display());

    let form = Form::new().part(FILE_FIELD, Self::file_part(file)?);
    let response = self
      .http
      .post(&url)
      .multipart(form)
      .timeout(VIDEO_TIMEOUT)
      .send()?;
    Self::read_json(response)
  }

  /// 下载处理后的视频到本地文件，返回写入字节数
  pub fn download(&self, url: &str, path: &Path) -> Result<u64, PredictError> {
    debug!("GET {}", url);

    let mut response = self.http.get(url).timeout(VIDEO_TIMEOUT).send()?;
    match response.status() {
      StatusCode::OK => {
        if let Some(parent) = path.parent()
          && !parent.as_os_str().is_empty()
        {
          std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        let written = std::io::copy(&mut response, &mut file)?;
        Ok(written)
      }
      status => {
        let body = response.text().unwrap_or_default();
        Err(PredictError::Status {
          status,
          detail: error_detail(&body),
        })
      }
    }
  }

  fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PredictError> {
    match response.status() {
      StatusCode::OK => Ok(response.json()?),
      status => {
        let body = response.text().unwrap_or_default();
        Err(PredictError::Status {
          status,
          detail: error_detail(&body),
        })
      }
    }
  }
}

/// 从任意失败中提取展示给用户的文案：
/// 优先取服务端结构化错误的 detail，其次取错误自身的消息，最后用兜底文案
pub fn extract_error_message(error: &anyhow::Error) -> String {
  if let Some(PredictError::Status {
    detail: Some(detail),
    ..
  }) = error.downcast_ref::<PredictError>()
  {
    return detail.clone();
  }

  let text = error.to_string();
  if text.trim().is_empty() {
    FALLBACK_MESSAGE.to_string()
  } else {
    text
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> PredictClient {
    PredictClient::new(&Url::parse(base).unwrap()).unwrap()
  }

  #[test]
  fn endpoint_join_ignores_trailing_slash() {
    assert_eq!(
      client("http://127.0.0.1:8000").endpoint(BOXES_ENDPOINT),
      "http://127.0.0.1:8000/predict/boxes"
    );
    assert_eq!(
      client("http://127.0.0.1:8000/").endpoint(BOXES_ENDPOINT),
      "http://127.0.0.1:8000/predict/boxes"
    );
    assert_eq!(
      client("http://detect.example.com/api/").endpoint(VIDEO_ENDPOINT),
      "http://detect.example.com/api/predict/video"
    );
  }

  #[test]
  fn error_detail_needs_structured_body() {
    assert_eq!(
      error_detail(r#"{"detail": "Type of file is wrong"}"#),
      Some("Type of file is wrong".to_string())
    );
    assert_eq!(error_detail(r#"{"message": "nope"}"#), None);
    assert_eq!(error_detail("<html>502</html>"), None);
    assert_eq!(error_detail(""), None);
  }

  #[test]
  fn message_prefers_server_detail() {
    let error = anyhow::Error::new(PredictError::Status {
      status: StatusCode::BAD_REQUEST,
      detail: Some("Type of file is wrong".to_string()),
    });
    assert_eq!(extract_error_message(&error), "Type of file is wrong");
  }

  #[test]
  fn message_finds_detail_behind_context() {
    let error = anyhow::Error::new(PredictError::Status {
      status: StatusCode::UNPROCESSABLE_ENTITY,
      detail: Some("bad payload".to_string()),
    })
    .context("uploading image");
    assert_eq!(extract_error_message(&error), "bad payload");
  }

  #[test]
  fn message_falls_back_to_display() {
    let error = anyhow::Error::new(PredictError::Status {
      status: StatusCode::INTERNAL_SERVER_ERROR,
      detail: None,
    });
    assert_eq!(
      extract_error_message(&error),
      "Unexpected status 500 Internal Server Error: no detail"
    );
  }

  #[test]
  fn message_falls_back_when_display_is_empty() {
    #[derive(Debug)]
    struct Silent;

    impl std::fmt::Display for Silent {
      fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Ok(())
      }
    }

    impl std::error::Error for Silent {}

    let error = anyhow::Error::new(Silent);
    assert_eq!(extract_error_message(&error), FALLBACK_MESSAGE);
  }
}
