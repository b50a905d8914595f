// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses the `POST /run` multipart body (§4.6) into a `Submission`. Field
//! order in the request is irrelevant; unknown fields are ignored.

use crate::error::ApiError;
use axum::extract::Multipart;
use isolab_core::{JobId, SessionId};
use isolab_engine::Submission;

pub async fn parse_submission(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut source_code = None;
    let mut image_bytes = None;
    let mut image_ref = None;
    let mut user_id = None;
    let mut session_id = None;
    let mut previous_attempt_id = None;
    let mut user_prompt = None;
    let mut ai_model = None;
    let mut inject_debug = false;
    let mut script_parameters = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadMultipart(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "code" => {
                let text = field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?;
                source_code = Some(text);
            }
            "image" => {
                let bytes = field.bytes().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?;
                image_bytes = Some(bytes.to_vec());
            }
            "image_ref" => {
                image_ref = Some(field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?);
            }
            "user_id" => {
                user_id = Some(field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?);
            }
            "session_id" => {
                let text = field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?;
                session_id = Some(SessionId::from(text.as_str()));
            }
            "previous_attempt_id" => {
                let text = field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?;
                previous_attempt_id = Some(JobId::from(text.as_str()));
            }
            "user_prompt" => {
                user_prompt = Some(field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?);
            }
            "ai_model" => {
                ai_model = Some(field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?);
            }
            "inject_debug" => {
                let text = field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?;
                inject_debug = matches!(text.as_str(), "true" | "1" | "yes");
            }
            "script_parameters" => {
                script_parameters = Some(field.text().await.map_err(|e| ApiError::BadMultipart(e.to_string()))?);
            }
            _ => {
                // Unknown field; drain it and move on.
                let _ = field.bytes().await;
            }
        }
    }

    let source_code = source_code.ok_or(ApiError::MissingField("code"))?;

    Ok(Submission {
        source_code,
        image_bytes,
        image_ref,
        user_id,
        session_id,
        previous_attempt_id,
        user_prompt,
        ai_model,
        inject_debug,
        script_parameters,
    })
}
