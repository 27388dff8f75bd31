//! Builder 模式实现
//!
//! 提供链式构造 [`Arm`] 的便捷方式：上下文、分发器、遥测服务和技能表一次装配完成。

use crate::context::ArmContext;
use crate::dispatch::DispatchRouter;
use crate::error::DriverError;
use crate::skills::SkillExecutor;
use crate::telemetry::{TelemetryConfig, TelemetryService};
use armctl_kinematics::{AnalyticIkSolver, ArmGeometry};
use armctl_protocol::ControlMode;
use armctl_serial::{SerialConfig, Transport, open_transport};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 装配完成的机械臂服务
///
/// 遥测服务不会自动启动，需要调用 [`Arm::start_telemetry`]。
pub struct Arm {
    context: Arc<ArmContext>,
    router: DispatchRouter,
    telemetry: Arc<TelemetryService>,
    skills: SkillExecutor,
}

impl fmt::Debug for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arm")
            .field("context", &self.context)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl Arm {
    pub fn context(&self) -> &Arc<ArmContext> {
        &self.context
    }

    pub fn router(&self) -> &DispatchRouter {
        &self.router
    }

    pub fn telemetry(&self) -> &Arc<TelemetryService> {
        &self.telemetry
    }

    pub fn skills(&self) -> &SkillExecutor {
        &self.skills
    }

    pub fn start_telemetry(&self) -> Result<(), DriverError> {
        self.telemetry.start()
    }

    /// 停止遥测并关闭传输
    ///
    /// 关闭时若配置了握手指令，会先发送 `remote_disable`。
    pub fn shutdown(&self) -> Result<(), DriverError> {
        let result = self.telemetry.stop();
        if let Some(transport) = self.context.transport() {
            transport.close();
        }
        info!("Arm shut down");
        result
    }
}

/// Arm Builder（链式构造）
///
/// # Example
///
/// ```rust
/// use armctl_driver::ArmBuilder;
/// use armctl_protocol::ControlMode;
/// use armctl_serial::MockTransport;
/// use std::sync::Arc;
///
/// let arm = ArmBuilder::new()
///     .transport(Arc::new(MockTransport::new()))
///     .mode(ControlMode::Physical)
///     .build();
///
/// let result = arm.router().dispatch(&[0.0, 10.0, 20.0, 0.0, -30.0, 0.0], "doc");
/// assert!(result.serial_sent);
/// assert!(result.serial_mock);
/// ```
pub struct ArmBuilder {
    /// 串口配置（未注入传输时据此选择实现）
    serial_config: SerialConfig,
    /// 显式注入的传输（测试、自定义链路）
    transport: Option<Arc<dyn Transport>>,
    /// 不创建任何传输
    detached: bool,
    mode: ControlMode,
    telemetry: TelemetryConfig,
    geometry: ArmGeometry,
}

impl ArmBuilder {
    pub fn new() -> Self {
        Self {
            serial_config: SerialConfig::default(),
            transport: None,
            detached: false,
            mode: ControlMode::default(),
            telemetry: TelemetryConfig::default(),
            geometry: ArmGeometry::DEFAULT,
        }
    }

    /// 设置串口配置
    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.serial_config = config;
        self
    }

    /// 注入传输实现（优先于串口配置）
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self.detached = false;
        self
    }

    /// 不创建传输；实体模式下的指令只记录
    pub fn without_transport(mut self) -> Self {
        self.transport = None;
        self.detached = true;
        self
    }

    /// 初始控制模式（默认仿真）
    pub fn mode(mut self, mode: ControlMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn telemetry_config(mut self, config: TelemetryConfig) -> Self {
        self.telemetry = config;
        self
    }

    /// 遥测周期（默认 100ms）
    pub fn telemetry_period(mut self, period: Duration) -> Self {
        if period.is_zero() {
            warn!("Ignoring zero telemetry period, keeping {:?}", self.telemetry.period);
        } else {
            self.telemetry.period = period;
        }
        self
    }

    pub fn geometry(mut self, geometry: ArmGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// 构建 [`Arm`]
    ///
    /// 串口打开失败不会报错：传输保持断开状态，首次发送时重连。
    pub fn build(self) -> Arm {
        let transport = match (self.transport, self.detached) {
            (Some(transport), _) => Some(transport),
            (None, true) => None,
            (None, false) => Some(open_transport(&self.serial_config)),
        };

        let context = Arc::new(ArmContext::new(transport, self.mode, self.serial_config));
        let solver = AnalyticIkSolver::new(self.geometry);
        let router = DispatchRouter::with_solver(context.clone(), solver);
        let telemetry = Arc::new(TelemetryService::new(context.clone(), self.telemetry));

        info!(
            "Arm assembled: mode={}, link={}",
            context.mode(),
            context.link_state().as_str()
        );

        Arm {
            context,
            router,
            telemetry,
            skills: SkillExecutor::new(solver),
        }
    }
}

impl Default for ArmBuilder {
    fn default() -> Self {
        Self::new()
    }
}
