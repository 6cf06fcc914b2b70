use std::fmt;

use firecam_core::error::{CameraError, Result};

/// Camera 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum CameraState {
    #[default]
    Uninitialized,
    /// 设备已打开，尚未应用配置 (或配置失败)
    Opened,
    /// 模式已协商、DMA 缓冲区已分配
    Configured,
    /// 连续传输中
    Streaming,
    /// 传输已停止，缓冲区仍保留
    Stopped,
    Closed,
}

impl CameraState {
    /// 状态转移表
    pub fn can_transition(self, to: CameraState) -> bool {
        use CameraState::*;
        match (self, to) {
            // 任意状态都可以关闭
            (_, Closed) => true,
            (Uninitialized | Closed, Opened) => true,
            (Opened, Configured) => true,
            (Configured | Stopped, Streaming) => true,
            (Streaming, Stopped) => true,
            // 重新协商或取帧失败：退回 Opened
            (Configured | Streaming | Stopped, Opened) => true,
            _ => false,
        }
    }

    /// 可以取帧、读写 Feature
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Configured | Self::Streaming | Self::Stopped)
    }

    /// 设备句柄有效
    pub fn is_open(self) -> bool {
        matches!(
            self,
            Self::Opened | Self::Configured | Self::Streaming | Self::Stopped
        )
    }
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Opened => "opened",
            Self::Configured => "configured",
            Self::Streaming => "streaming",
            Self::Stopped => "stopped",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// 带守卫条件的状态机
#[derive(Debug, Default)]
pub(crate) struct StateMachine {
    state: CameraState,
}

impl StateMachine {
    pub(crate) fn current(&self) -> CameraState {
        self.state
    }

    pub(crate) fn transition(&mut self, to: CameraState, operation: &'static str) -> Result<()> {
        if self.state == to {
            return Ok(());
        }
        if !self.state.can_transition(to) {
            return Err(CameraError::InvalidState {
                operation,
                state: self.state.to_string(),
            });
        }
        tracing::debug!(target: "firecam::state", "{} -> {} ({})", self.state, to, operation);
        self.state = to;
        Ok(())
    }

    /// 仅在 ready 状态下放行
    pub(crate) fn require_ready(&self) -> Result<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(CameraError::NotReady)
        }
    }

    /// 结构性设置 (尺寸、ROI、Format7、1394b ...) 在 Streaming 时被拒绝
    pub(crate) fn require_not_streaming(&self, operation: &'static str) -> Result<()> {
        if self.state == CameraState::Streaming {
            return Err(CameraError::InvalidState {
                operation,
                state: self.state.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CameraState::*;

    #[test]
    fn closed_is_reachable_from_everywhere() {
        for s in [Uninitialized, Opened, Configured, Streaming, Stopped, Closed] {
            assert!(s.can_transition(Closed), "{s} -> closed");
        }
    }

    #[test]
    fn streaming_requires_configuration() {
        assert!(!Uninitialized.can_transition(Streaming));
        assert!(!Opened.can_transition(Streaming));
        assert!(Configured.can_transition(Streaming));
        assert!(Stopped.can_transition(Streaming));
        assert!(!Closed.can_transition(Configured));
    }

    #[test]
    fn readiness_matches_states() {
        assert!(!Uninitialized.is_ready());
        assert!(!Opened.is_ready());
        assert!(Configured.is_ready());
        assert!(Streaming.is_ready());
        assert!(Stopped.is_ready());
        assert!(!Closed.is_ready());
    }

    #[test]
    fn machine_rejects_invalid_edges() {
        let mut m = StateMachine::default();
        assert!(matches!(
            m.transition(Streaming, "start"),
            Err(CameraError::InvalidState { .. })
        ));
        m.transition(Opened, "setup").unwrap();
        m.transition(Configured, "setup").unwrap();
        m.transition(Streaming, "start").unwrap();
        assert!(m.require_not_streaming("set_size").is_err());
        m.transition(Stopped, "stop").unwrap();
        assert!(m.require_not_streaming("set_size").is_ok());
        assert!(m.require_ready().is_ok());
    }
}
