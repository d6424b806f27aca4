//! Wire format tests for SDCP frames
//!
//! Fixtures follow what SDCP v3 mainboards put on the wire.

use sdcp_core::{
    decode, decode_inbound, encode, Capability, CommandCode, DiscoveryMessage, ErrorCode,
    FileType, Inbound, MachineStatus, NetworkStatus, NotificationType, PrintStatus, Request,
    RequestData, RetrieveFileListResponse, Source, StartPrintRequest, StorageType, Topics,
    VideoStreamResponse, StreamAck,
};
use serde_json::{json, Value};

const STATUS_PUSH: &str = r#"{
    "Status": {
        "CurrentStatus": [1],
        "PreviousStatus": 0,
        "PrintScreen": 1200.5,
        "ReleaseFilm": 12,
        "TempOfUVLED": 42.5,
        "TimeLapseStatus": 0,
        "TempOfBox": 25.1,
        "TempTargetBox": 30,
        "PrintInfo": {
            "Status": 3,
            "CurrentLayer": 120,
            "TotalLayer": 980,
            "CurrentTicks": 360000,
            "TotalTicks": 2880000,
            "Filename": "benchy.ctb",
            "ErrorNumber": 0,
            "TaskId": "2b37a6ec-0a23-4d2a-98b2-5fd1e9b2a4c7"
        }
    },
    "MainboardID": "A1B2",
    "TimeStamp": 1700000000,
    "Topic": "sdcp/status/A1B2"
}"#;

const ATTRIBUTES_PUSH: &str = r#"{
    "Attributes": {
        "Name": "Saturn",
        "MachineName": "Saturn 4 Ultra",
        "BrandName": "ELEGOO",
        "ProtocolVersion": "V3.0.0",
        "FirmwareVersion": "V1.2.0",
        "Resolution": "11520x5120",
        "XYZsize": "218.88x122.88x220",
        "MainboardIP": "10.0.0.5",
        "MainboardID": "A1B2",
        "NumberOfVideoStreamConnected": 0,
        "MaximumVideoStreamAllowed": 1,
        "NetworkStatus": "wlan",
        "UsbDiskStatus": 1,
        "Capabilities": ["FILE_TRANSFER", "PRINT_CONTROL", "VIDEO_STREAM"],
        "SupportFileType": ["CTB"],
        "DevicesStatus": {
            "TempSensorStatusOfUVLED": 1,
            "LCDStatus": 1,
            "SgStatus": 1,
            "ZMotorStatus": 1,
            "XMotorStatus": 1,
            "RelaseFilmState": 1,
            "CameraStatus": 1
        },
        "ReleaseFilmMax": 60000,
        "TempOfUVLEDMax": 70,
        "CameraStatus": 1,
        "RemainingMemory": 123455,
        "TLPNoCapPos": 50.0,
        "TLPStartCapPos": 30.0,
        "TLPInterLayers": 20
    },
    "MainboardID": "A1B2",
    "TimeStamp": 1700000000,
    "Topic": "sdcp/attributes/A1B2"
}"#;

#[test]
fn test_request_wire_shape() {
    let request = Request {
        topic: "sdcp/request/A1B2".to_string(),
        id: "fluxsdcp".to_string(),
        data: RequestData {
            cmd: CommandCode::StartPrint,
            data: StartPrintRequest {
                filename: "benchy.ctb".to_string(),
                start_layer: 0,
            },
            request_id: "6d9b0f".to_string(),
            mainboard_id: "A1B2".to_string(),
            timestamp: 1700000000,
            from: Source::LocalPc,
        },
    };

    let encoded = encode(&request).expect("encode failed");
    let value: Value = serde_json::from_slice(&encoded).unwrap();

    assert_eq!(
        value,
        json!({
            "Topic": "sdcp/request/A1B2",
            "Id": "fluxsdcp",
            "Data": {
                "Cmd": 128,
                "Data": {"Filename": "benchy.ctb", "StartLayer": 0},
                "RequestID": "6d9b0f",
                "MainboardID": "A1B2",
                "TimeStamp": 1700000000,
                "From": 0
            }
        })
    );
}

#[test]
fn test_status_push() {
    let topics = Topics::new("A1B2");
    let inbound = decode_inbound(&topics, STATUS_PUSH.as_bytes()).expect("decode failed");

    let Inbound::Status(message) = inbound else {
        panic!("expected a status push");
    };
    let status = message.status;
    assert_eq!(status.current_status, vec![MachineStatus::Printing]);
    assert_eq!(status.temp_of_uvled, 42.5);
    assert_eq!(status.temp_target_box, 30.0);
    assert_eq!(status.print_info.status, PrintStatus::Exposing);
    assert_eq!(status.print_info.total_layer, 980);
    assert_eq!(status.print_info.filename, "benchy.ctb");
    assert!(status.is_printing());
}

#[test]
fn test_attributes_push() {
    let topics = Topics::new("A1B2");
    let inbound = decode_inbound(&topics, ATTRIBUTES_PUSH.as_bytes()).expect("decode failed");

    let Inbound::Attributes(message) = inbound else {
        panic!("expected an attributes push");
    };
    let attributes = message.attributes;
    assert_eq!(attributes.model, "Saturn 4 Ultra");
    assert_eq!(attributes.xyz_size, "218.88x122.88x220");
    assert_eq!(attributes.mainboard_ip, "10.0.0.5");
    assert_eq!(attributes.network_status, NetworkStatus::Wlan);
    assert_eq!(attributes.tlp_inter_layers, 20);
    assert!(attributes.supports(&Capability::VideoStream));
}

#[test]
fn test_response_payload() {
    let topics = Topics::new("A1B2");
    let frame = json!({
        "Id": "fluxsdcp",
        "Data": {
            "Cmd": 386,
            "Data": {"Ack": 0, "VideoUrl": "rtsp://10.0.0.5:554/video"},
            "RequestID": "6d9b0f",
            "MainboardID": "A1B2",
            "TimeStamp": 1700000001
        },
        "Topic": "sdcp/response/A1B2"
    });

    let inbound = decode_inbound(&topics, frame.to_string().as_bytes()).unwrap();
    let Inbound::Response(response) = inbound else {
        panic!("expected a response");
    };

    assert_eq!(response.request_id(), "6d9b0f");
    assert_eq!(response.data.cmd, CommandCode::VideoStream);

    let payload: VideoStreamResponse = response.into_payload().unwrap();
    assert_eq!(payload.ack, StreamAck::Ok);
    assert_eq!(payload.video_url, "rtsp://10.0.0.5:554/video");
}

#[test]
fn test_response_payload_mismatch() {
    let topics = Topics::new("A1B2");
    let frame = json!({
        "Topic": "sdcp/response/A1B2",
        "Data": {"Cmd": 386, "Data": {"Ack": "x"}, "RequestID": "1", "MainboardID": "A1B2"}
    });

    let Inbound::Response(response) = decode_inbound(&topics, frame.to_string().as_bytes()).unwrap()
    else {
        panic!("expected a response");
    };
    let err = response.into_payload::<VideoStreamResponse>().unwrap_err();
    assert!(!err.is_envelope());
}

#[test]
fn test_file_list_response() {
    let payload = json!({
        "Ack": 0,
        "FileList": [
            {"name": "/usb/models", "usedSize": 0, "totalSize": 0, "storageType": 1, "type": 0},
            {"name": "/usb/benchy.ctb", "usedSize": 4096, "totalSize": 0, "storageType": 1, "type": 1}
        ]
    });

    let response: RetrieveFileListResponse = serde_json::from_value(payload).unwrap();
    assert_eq!(response.file_list.len(), 2);
    assert_eq!(response.file_list[0].kind, FileType::Folder);
    assert_eq!(response.file_list[1].kind, FileType::File);
    assert_eq!(response.file_list[1].storage_type, StorageType::External);
    assert_eq!(response.file_list[1].name.as_str(), "/usb/benchy.ctb");
}

#[test]
fn test_error_and_notice_pushes() {
    let topics = Topics::new("A1B2");

    let error = json!({
        "Id": "",
        "Data": {"Data": {"ErrorCode": 2}, "MainboardID": "A1B2", "TimeStamp": 1},
        "Topic": "sdcp/error/A1B2"
    });
    let Inbound::Error(message) = decode_inbound(&topics, error.to_string().as_bytes()).unwrap()
    else {
        panic!("expected an error push");
    };
    assert_eq!(message.data.data.error_code, ErrorCode::FormatFailed);

    let notice = json!({
        "Id": "",
        "Data": {"Data": {"Message": "[]", "Type": 1}, "MainboardID": "A1B2", "TimeStamp": 1},
        "Topic": "sdcp/notice/A1B2"
    });
    let Inbound::Notice(message) = decode_inbound(&topics, notice.to_string().as_bytes()).unwrap()
    else {
        panic!("expected a notice push");
    };
    assert_eq!(message.data.data.kind, NotificationType::HistorySynchronized);
}

#[test]
fn test_discovery_reply() {
    let reply = r#"{
        "Id": "979d4C788A4a78bC777A870F1A02867A",
        "Data": {
            "Name": "Saturn",
            "MachineName": "Saturn 4 Ultra",
            "BrandName": "ELEGOO",
            "MainboardIP": "10.0.0.5",
            "MainboardID": "A1B2",
            "ProtocolVersion": "V3.0.0",
            "FirmwareVersion": "V1.2.0"
        }
    }"#;

    let message: DiscoveryMessage = decode(reply.as_bytes()).unwrap();
    assert_eq!(message.data.mainboard_id, "A1B2");
    assert_eq!(message.data.model, "Saturn 4 Ultra");
    assert_eq!(message.data.protocol_version, "V3.0.0");
}
