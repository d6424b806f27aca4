//! Device state snapshots and the enumerations they carry

use serde::{Deserialize, Serialize};

use crate::path::FilePath;

code_enum! {
    /// Overall machine state
    pub enum MachineStatus: u8 else Unknown {
        #[default]
        Idle = 0,
        Printing = 1,
        FileTransferring = 2,
        ExposureTesting = 3,
        DevicesTesting = 4,
    }
}

code_enum! {
    /// Printing sub-state
    pub enum PrintStatus: u8 else Unknown {
        #[default]
        Idle = 0,
        Homing = 1,
        Dropping = 2,
        Exposing = 3,
        Lifting = 4,
        Pausing = 5,
        Paused = 6,
        Stopping = 7,
        Stopped = 8,
        Complete = 9,
        FileChecking = 10,
    }
}

code_enum! {
    /// File problems reported while a print is running
    pub enum PrintError: u8 else Unknown {
        #[default]
        None = 0,
        Md5Check = 1,
        FileIo = 2,
        InvalidResolution = 3,
        UnknownFormat = 4,
        UnknownModel = 5,
    }
}

code_enum! {
    pub enum TimeLapseStatus: u8 else Unknown {
        #[default]
        Off = 0,
        On = 1,
    }
}

code_enum! {
    pub enum UsbDiskStatus: u8 else Unknown {
        #[default]
        Disconnected = 0,
        Connected = 1,
    }
}

code_enum! {
    pub enum CameraStatus: u8 else Unknown {
        #[default]
        Disconnected = 0,
        Connected = 1,
    }
}

code_enum! {
    /// UV LED temperature sensor state
    pub enum SensorStatus: u8 else Unknown {
        #[default]
        Disconnected = 0,
        Normal = 1,
        Abnormal = 2,
    }
}

code_enum! {
    /// Connection state of a peripheral (LCD, motors)
    pub enum LinkStatus: u8 else Unknown {
        #[default]
        Disconnected = 0,
        Connected = 1,
    }
}

code_enum! {
    /// Strain gauge state
    pub enum StrainGaugeStatus: u8 else Unknown {
        #[default]
        Disconnected = 0,
        Normal = 1,
        CalibrationFailed = 2,
    }
}

code_enum! {
    pub enum ReleaseFilmState: u8 else Unknown {
        #[default]
        Abnormal = 0,
        Normal = 1,
    }
}

code_enum! {
    pub enum StorageType: u8 else Unknown {
        #[default]
        Internal = 0,
        External = 1,
    }
}

code_enum! {
    pub enum FileType: u8 else Unknown {
        #[default]
        Folder = 0,
        File = 1,
    }
}

code_enum! {
    pub enum TaskStatus: u8 else Unknown {
        #[default]
        Other = 0,
        Completed = 1,
        Exceptional = 2,
        Stopped = 3,
    }
}

code_enum! {
    pub enum TimeLapseVideoStatus: u8 else Unknown {
        #[default]
        NotShot = 0,
        Exists = 1,
        Deleted = 2,
        Generating = 3,
        GenerationFailed = 4,
    }
}

code_enum! {
    /// Reason a historical task ended abnormally
    pub enum TaskError: u8 else Unknown {
        #[default]
        Ok = 0,
        OverTemperature = 1,
        CalibrateFailed = 2,
        ResinLack = 3,
        ResinOver = 4,
        ProbeFail = 5,
        ForeignBody = 6,
        LevelFailed = 7,
        ReleaseFailed = 8,
        StrainGaugeOffline = 9,
        LcdDetectFailed = 10,
        ReleaseOvercount = 11,
        UsbDiskRemoved = 12,
        HomeFailedX = 13,
        HomeFailedZ = 14,
        ResinAbnormalHigh = 15,
        ResinAbnormalLow = 16,
        HomeFailed = 17,
        PlatformFailed = 18,
        Error = 19,
        MoveAbnormal = 20,
        AicModelNone = 21,
        AicModelWarp = 22,
        HomeFailedY = 23,
        FileError = 24,
        CameraError = 25,
        NetworkError = 26,
        ServerConnectFailed = 27,
        DisconnectApp = 28,
        CheckAutoResinFeeder = 29,
        ContainerResinLow = 30,
        BottleDisconnect = 31,
        FeedTimeout = 32,
        TankTempSensorOffline = 33,
        TankTempSensorError = 34,
    }
}

/// Active network interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    #[default]
    Wlan,
    Eth,
    #[serde(other)]
    Unknown,
}

/// Sub-protocols a mainboard advertises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    FileTransfer,
    PrintControl,
    VideoStream,
    #[serde(other)]
    Unknown,
}

/// Progress of the current print job
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PrintInfo {
    pub status: PrintStatus,
    pub current_layer: u32,
    pub total_layer: u32,
    /// Elapsed print time in milliseconds
    pub current_ticks: u64,
    /// Estimated total print time in milliseconds
    pub total_ticks: u64,
    pub filename: String,
    pub error_number: PrintError,
    pub task_id: String,
}

/// Last pushed machine status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Status {
    pub current_status: Vec<MachineStatus>,
    pub previous_status: MachineStatus,
    /// Total exposure screen usage in seconds
    pub print_screen: f64,
    pub release_film: u32,
    #[serde(rename = "TempOfUVLED")]
    pub temp_of_uvled: f64,
    pub time_lapse_status: TimeLapseStatus,
    pub temp_of_box: f64,
    pub temp_target_box: f64,
    pub print_info: PrintInfo,
}

impl Status {
    pub fn is_printing(&self) -> bool {
        self.current_status.contains(&MachineStatus::Printing)
    }
}

/// Self-check results for each peripheral
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DevicesStatus {
    #[serde(rename = "TempSensorStatusOfUVLED")]
    pub uvled_temp_sensor: SensorStatus,
    #[serde(rename = "LCDStatus")]
    pub lcd_status: LinkStatus,
    pub sg_status: StrainGaugeStatus,
    pub z_motor_status: LinkStatus,
    pub rotate_motor_status: LinkStatus,
    pub release_film_state: ReleaseFilmState,
    pub x_motor_status: LinkStatus,
}

/// Last pushed machine attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Attributes {
    pub name: String,
    #[serde(rename = "MachineName")]
    pub model: String,
    pub brand_name: String,
    pub protocol_version: String,
    pub firmware_version: String,
    pub resolution: String,
    /// Build volume in millimetres, e.g. `"218.88x122.88x260"`
    #[serde(rename = "XYZsize")]
    pub xyz_size: String,
    #[serde(rename = "MainboardIP")]
    pub mainboard_ip: String,
    #[serde(rename = "MainboardID")]
    pub mainboard_id: String,
    pub number_of_video_stream_connected: u32,
    pub maximum_video_stream_allowed: u32,
    pub network_status: NetworkStatus,
    pub usb_disk_status: UsbDiskStatus,
    pub capabilities: Vec<Capability>,
    pub support_file_type: Vec<String>,
    pub devices_status: DevicesStatus,
    pub release_film_max: u32,
    #[serde(rename = "TempOfUVLEDMax")]
    pub temp_of_uvled_max: f64,
    pub camera_status: CameraStatus,
    pub remaining_memory: u64,
    #[serde(rename = "TLPNoCapPos")]
    pub tlp_no_cap_pos: f64,
    #[serde(rename = "TLPStartCapPos")]
    pub tlp_start_cap_pos: f64,
    #[serde(rename = "TLPInterLayers")]
    pub tlp_inter_layers: u32,
}

impl Attributes {
    pub fn supports(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

/// One entry of a storage listing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileEntry {
    pub name: FilePath,
    pub used_size: u64,
    pub total_size: u64,
    pub storage_type: StorageType,
    #[serde(rename = "type")]
    pub kind: FileType,
}

/// Details of a historical print task
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskDetails {
    pub thumbnail: String,
    pub task_name: String,
    pub begin_time: u64,
    pub end_time: u64,
    pub task_status: TaskStatus,
    pub slice_information: serde_json::Value,
    pub already_print_layer: u32,
    pub task_id: String,
    #[serde(rename = "MD5")]
    pub md5: String,
    /// Resin used so far in millilitres
    pub current_layer_tal_volume: f64,
    pub time_lapse_video_status: TimeLapseVideoStatus,
    pub time_lapse_video_url: String,
    pub error_status_reason: TaskError,
}
