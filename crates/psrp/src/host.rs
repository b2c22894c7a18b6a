//! The remote host method catalog (MS-PSRP §2.2.3.17), shared by
//! `RunspacePoolHostCall`/`RunspacePoolHostResponse` and
//! `PipelineHostCall`/`PipelineHostResponse`.
//!
//! This crate stops at identifying which method was called and carrying its
//! raw `PsValue` parameters; decoding those parameters into typed Rust
//! values (a `Coordinates`, a `PSCredential`) and actually driving a
//! terminal or prompting a user is the embedder's job.

use crate::{PsrpError, Result};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteHostMethodId {
    GetName = 1,
    GetVersion = 2,
    GetInstanceId = 3,
    GetCurrentCulture = 4,
    GetCurrentUICulture = 5,
    SetShouldExit = 6,
    EnterNestedPrompt = 7,
    ExitNestedPrompt = 8,
    NotifyBeginApplication = 9,
    NotifyEndApplication = 10,
    ReadLine = 11,
    ReadLineAsSecureString = 12,
    Write1 = 13,
    Write2 = 14,
    WriteLine1 = 15,
    WriteLine2 = 16,
    WriteLine3 = 17,
    WriteErrorLine = 18,
    WriteDebugLine = 19,
    WriteProgress = 20,
    WriteVerboseLine = 21,
    WriteWarningLine = 22,
    Prompt = 23,
    PromptForCredential1 = 24,
    PromptForCredential2 = 25,
    PromptForChoice = 26,
    GetForegroundColor = 27,
    SetForegroundColor = 28,
    GetBackgroundColor = 29,
    SetBackgroundColor = 30,
    GetCursorPosition = 31,
    SetCursorPosition = 32,
    GetWindowPosition = 33,
    SetWindowPosition = 34,
    GetCursorSize = 35,
    SetCursorSize = 36,
    GetBufferSize = 37,
    SetBufferSize = 38,
    GetWindowSize = 39,
    SetWindowSize = 40,
    GetWindowTitle = 41,
    SetWindowTitle = 42,
    GetMaxWindowSize = 43,
    GetMaxPhysicalWindowSize = 44,
    GetKeyAvailable = 45,
    ReadKey = 46,
    FlushInputBuffer = 47,
    SetBufferContents1 = 48,
    SetBufferContents2 = 49,
    GetBufferContents = 50,
    ScrollBufferContents = 51,
    PushRunspace = 52,
    PopRunspace = 53,
    GetIsRunspacePushed = 54,
    GetRunspace = 55,
    PromptForChoiceMultipleSelection = 56,
}

impl RemoteHostMethodId {
    pub const fn value(self) -> i32 {
        self as i32
    }

    /// Whether a `HostResponse` is expected for this call. Methods that
    /// return `void` on the host interface never get one.
    pub const fn expects_response(self) -> bool {
        use RemoteHostMethodId::*;
        matches!(
            self,
            GetName
                | GetVersion
                | GetInstanceId
                | GetCurrentCulture
                | GetCurrentUICulture
                | ReadLine
                | ReadLineAsSecureString
                | Prompt
                | PromptForCredential1
                | PromptForCredential2
                | PromptForChoice
                | GetForegroundColor
                | GetBackgroundColor
                | GetCursorPosition
                | GetWindowPosition
                | GetCursorSize
                | GetBufferSize
                | GetWindowSize
                | GetWindowTitle
                | GetMaxWindowSize
                | GetMaxPhysicalWindowSize
                | GetKeyAvailable
                | ReadKey
                | GetBufferContents
                | GetIsRunspacePushed
                | GetRunspace
                | PromptForChoiceMultipleSelection
        )
    }
}

impl TryFrom<i32> for RemoteHostMethodId {
    type Error = PsrpError;

    fn try_from(value: i32) -> Result<Self> {
        use RemoteHostMethodId::*;
        Ok(match value {
            1 => GetName,
            2 => GetVersion,
            3 => GetInstanceId,
            4 => GetCurrentCulture,
            5 => GetCurrentUICulture,
            6 => SetShouldExit,
            7 => EnterNestedPrompt,
            8 => ExitNestedPrompt,
            9 => NotifyBeginApplication,
            10 => NotifyEndApplication,
            11 => ReadLine,
            12 => ReadLineAsSecureString,
            13 => Write1,
            14 => Write2,
            15 => WriteLine1,
            16 => WriteLine2,
            17 => WriteLine3,
            18 => WriteErrorLine,
            19 => WriteDebugLine,
            20 => WriteProgress,
            21 => WriteVerboseLine,
            22 => WriteWarningLine,
            23 => Prompt,
            24 => PromptForCredential1,
            25 => PromptForCredential2,
            26 => PromptForChoice,
            27 => GetForegroundColor,
            28 => SetForegroundColor,
            29 => GetBackgroundColor,
            30 => SetBackgroundColor,
            31 => GetCursorPosition,
            32 => SetCursorPosition,
            33 => GetWindowPosition,
            34 => SetWindowPosition,
            35 => GetCursorSize,
            36 => SetCursorSize,
            37 => GetBufferSize,
            38 => SetBufferSize,
            39 => GetWindowSize,
            40 => SetWindowSize,
            41 => GetWindowTitle,
            42 => SetWindowTitle,
            43 => GetMaxWindowSize,
            44 => GetMaxPhysicalWindowSize,
            45 => GetKeyAvailable,
            46 => ReadKey,
            47 => FlushInputBuffer,
            48 => SetBufferContents1,
            49 => SetBufferContents2,
            50 => GetBufferContents,
            51 => ScrollBufferContents,
            52 => PushRunspace,
            53 => PopRunspace,
            54 => GetIsRunspacePushed,
            55 => GetRunspace,
            56 => PromptForChoiceMultipleSelection,
            other => return Err(PsrpError::InvalidMessage(format!("unknown host method id: {other}"))),
        })
    }
}
