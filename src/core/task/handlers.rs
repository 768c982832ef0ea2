use actix::{Handler, MessageResult};
use log::{debug, warn};

use crate::core::error::TransferError;
use super::actor::TransferEngine;
use super::descriptor::Task;
use super::messages::*;
use super::piece::PieceHandler;
use super::state::TaskCommand;

impl<H: PieceHandler> Handler<Command> for TransferEngine<H> {
    type Result = MessageResult<Command>;
    fn handle(&mut self, msg: Command, ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.dispatch(msg.0, ctx))
    }
}

impl<H: PieceHandler> Handler<RawCommand> for TransferEngine<H> {
    type Result = MessageResult<RawCommand>;
    fn handle(&mut self, msg: RawCommand, ctx: &mut Self::Context) -> Self::Result {
        match TaskCommand::from_code(msg.0) {
            Some(command) => MessageResult(Some(self.dispatch(command, ctx))),
            None => {
                debug!("忽略无法识别的命令码 {}", msg.0);
                MessageResult(None)
            }
        }
    }
}

impl<H: PieceHandler> Handler<QueryState> for TransferEngine<H> {
    type Result = MessageResult<QueryState>;
    fn handle(&mut self, _msg: QueryState, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state())
    }
}

impl<H: PieceHandler> Handler<QueryTask> for TransferEngine<H> {
    type Result = MessageResult<QueryTask>;
    fn handle(&mut self, _msg: QueryTask, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.view().clone())
    }
}

impl<H: PieceHandler> Handler<QueryInFlight> for TransferEngine<H> {
    type Result = bool;
    fn handle(&mut self, _msg: QueryInFlight, _ctx: &mut Self::Context) -> bool {
        self.run.is_none()
    }
}

impl<H: PieceHandler> Handler<SetParams> for TransferEngine<H> {
    type Result = Result<(), TransferError>;
    fn handle(&mut self, msg: SetParams, _ctx: &mut Self::Context) -> Self::Result {
        let task = self.held_task()?;
        task.params = msg.0;
        Ok(())
    }
}

impl<H: PieceHandler> Handler<SetHeaders> for TransferEngine<H> {
    type Result = Result<(), TransferError>;
    fn handle(&mut self, msg: SetHeaders, _ctx: &mut Self::Context) -> Self::Result {
        let task = self.held_task()?;
        task.headers = msg.0;
        Ok(())
    }
}

impl<H: PieceHandler> Handler<Reset> for TransferEngine<H> {
    type Result = Result<(), TransferError>;
    fn handle(&mut self, msg: Reset, _ctx: &mut Self::Context) -> Self::Result {
        let task = self.held_task()?;
        task.reset(msg.clear_progress);
        let snapshot = task.clone();
        self.snapshot = snapshot;
        Ok(())
    }
}

impl<H: PieceHandler> Handler<RunExited<H>> for TransferEngine<H> {
    type Result = ();
    fn handle(&mut self, msg: RunExited<H>, ctx: &mut Self::Context) {
        self.reclaim(msg.run, msg.exit, ctx);
    }
}

impl<H: PieceHandler> TransferEngine<H> {
    /// 只有两次运行之间才能修改描述
    fn held_task(&mut self) -> Result<&mut Task, TransferError> {
        match self.run.as_mut() {
            Some(run) => Ok(&mut run.task),
            None => {
                warn!("任务 {} 正在传输中，拒绝修改", self.snapshot.id);
                Err(TransferError::TaskBusy)
            }
        }
    }
}
