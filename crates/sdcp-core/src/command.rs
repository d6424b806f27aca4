//! Command codes and the typed request/response catalogue
//!
//! Every request payload is bound to its command code and to the payload
//! type the printer answers with through the [`Command`] trait, so a session
//! can offer a single generic `call` for the whole closed command set.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::path::FilePath;
use crate::types::{FileEntry, TaskDetails};

code_enum! {
    /// SDCP command codes
    pub enum CommandCode: u16 {
        #[default]
        StatusRefresh = 0,
        Attributes = 1,
        StartPrint = 128,
        PausePrint = 129,
        StopPrint = 130,
        ResumePrint = 131,
        StopFeedingMaterial = 132,
        SkipPreheating = 133,
        ChangePrinterName = 192,
        TerminateFileTransfer = 255,
        RetrieveFileList = 258,
        BatchDeleteFiles = 259,
        RetrieveHistoricalTasks = 320,
        RetrieveTaskDetails = 321,
        VideoStream = 386,
        TimeLapse = 387,
    }
}

code_enum! {
    /// Origin of a command
    pub enum Source: u8 {
        /// PC software on the local network
        #[default]
        LocalPc = 0,
        WebPc = 1,
        Web = 2,
        App = 3,
        Server = 4,
    }
}

code_enum! {
    pub enum Toggle: u8 {
        #[default]
        Disable = 0,
        Enable = 1,
    }
}

impl From<bool> for Toggle {
    fn from(enable: bool) -> Self {
        if enable {
            Toggle::Enable
        } else {
            Toggle::Disable
        }
    }
}

code_enum! {
    /// Answer to a start-print request
    pub enum ControlAck: u8 {
        #[default]
        Ok = 0,
        Busy = 1,
        NotFound = 2,
        Md5Failed = 3,
        FileIoFailed = 4,
        InvalidResolution = 5,
        UnknownFormat = 6,
        UnknownModel = 7,
    }
}

code_enum! {
    pub enum FileTransferAck: u8 {
        #[default]
        Success = 0,
        NotTransferring = 1,
        Checking = 2,
        NotFound = 3,
    }
}

code_enum! {
    /// Answer to a video stream toggle
    pub enum StreamAck: u8 {
        #[default]
        Ok = 0,
        TooManyConnections = 1,
        NoCamera = 2,
        Unknown = 3,
    }
}

/// A request payload with a fixed command code and response shape
pub trait Command: Serialize + Send + Sync {
    const CODE: CommandCode;
    type Response: DeserializeOwned + Send;
}

macro_rules! bind_command {
    ($($request:ty => $response:ty, $code:ident;)+) => {
        $(
            impl Command for $request {
                const CODE: CommandCode = CommandCode::$code;
                type Response = $response;
            }
        )+
    };
}

/// Plain acknowledgement; `0` means accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(rename = "Ack", default)]
    pub ack: i64,
}

impl AckResponse {
    pub fn is_ok(&self) -> bool {
        self.ack == 0
    }
}

pub type StatusRefreshResponse = AckResponse;
pub type AttributesRefreshResponse = AckResponse;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRefreshRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributesRefreshRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartPrintRequest {
    pub filename: String,
    pub start_layer: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartPrintResponse {
    #[serde(rename = "Ack", default)]
    pub ack: ControlAck,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PausePrintRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopPrintRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumePrintRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopFeedingMaterialRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkipPreheatingRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangePrinterNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TerminateFileTransferRequest {
    pub uuid: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminateFileTransferResponse {
    #[serde(rename = "Ack", default)]
    pub ack: FileTransferAck,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetrieveFileListRequest {
    pub url: FilePath,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RetrieveFileListResponse {
    pub ack: i64,
    pub file_list: Vec<FileEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchDeleteFilesRequest {
    pub file_list: Vec<FilePath>,
    pub folder_list: Vec<FilePath>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BatchDeleteFilesResponse {
    pub ack: i64,
    /// Entries that could not be deleted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub err_data: Vec<FilePath>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieveHistoricalTasksRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RetrieveHistoricalTasksResponse {
    pub ack: i64,
    /// Task ids, newest first
    pub history_data: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetrieveTaskDetailsRequest {
    pub id: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RetrieveTaskDetailsResponse {
    pub ack: i64,
    pub history_detail_list: Vec<TaskDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideoStreamRequest {
    pub enable: Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VideoStreamResponse {
    pub ack: StreamAck,
    /// RTSP address, only set when the stream was enabled
    pub video_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeLapseRequest {
    pub enable: Toggle,
}

bind_command! {
    StatusRefreshRequest => StatusRefreshResponse, StatusRefresh;
    AttributesRefreshRequest => AttributesRefreshResponse, Attributes;
    StartPrintRequest => StartPrintResponse, StartPrint;
    PausePrintRequest => AckResponse, PausePrint;
    StopPrintRequest => AckResponse, StopPrint;
    ResumePrintRequest => AckResponse, ResumePrint;
    StopFeedingMaterialRequest => AckResponse, StopFeedingMaterial;
    SkipPreheatingRequest => AckResponse, SkipPreheating;
    ChangePrinterNameRequest => AckResponse, ChangePrinterName;
    TerminateFileTransferRequest => TerminateFileTransferResponse, TerminateFileTransfer;
    RetrieveFileListRequest => RetrieveFileListResponse, RetrieveFileList;
    BatchDeleteFilesRequest => BatchDeleteFilesResponse, BatchDeleteFiles;
    RetrieveHistoricalTasksRequest => RetrieveHistoricalTasksResponse, RetrieveHistoricalTasks;
    RetrieveTaskDetailsRequest => RetrieveTaskDetailsResponse, RetrieveTaskDetails;
    VideoStreamRequest => VideoStreamResponse, VideoStream;
    TimeLapseRequest => AckResponse, TimeLapse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_codes() {
        assert_eq!(<StatusRefreshRequest as Command>::CODE.code(), 0);
        assert_eq!(<AttributesRefreshRequest as Command>::CODE.code(), 1);
        assert_eq!(<VideoStreamRequest as Command>::CODE.code(), 386);
        assert_eq!(CommandCode::from_code(387), Some(CommandCode::TimeLapse));
        assert_eq!(CommandCode::from_code(2), None);
    }

    #[test]
    fn test_empty_payload_is_object() {
        let json = serde_json::to_string(&StatusRefreshRequest {}).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_video_toggle_payload() {
        let json = serde_json::to_value(VideoStreamRequest { enable: true.into() }).unwrap();
        assert_eq!(json, serde_json::json!({"Enable": 1}));
    }
}
