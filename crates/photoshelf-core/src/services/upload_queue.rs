//! 上传队列计数器
//!
//! 调度器内部状态：下一个要启动的下标、进行中数量、已完成数量。
//! 只由调度循环单线程修改。

/// 上传队列
#[derive(Debug, Clone)]
pub struct UploadQueue {
    total: usize,
    concurrency: usize,
    next_index: usize,
    in_flight: usize,
    completed: usize,
    drained: bool,
}

impl UploadQueue {
    /// 并发数为 0 时按 1 处理
    pub fn new(total: usize, concurrency: usize) -> Self {
        Self {
            total,
            concurrency: concurrency.max(1),
            next_index: 0,
            in_flight: 0,
            completed: 0,
            drained: false,
        }
    }

    /// 有空位且还有未开始的文件时，占用一个空位并返回文件下标
    pub fn next_to_start(&mut self) -> Option<usize> {
        if self.in_flight < self.concurrency && self.next_index < self.total {
            let index = self.next_index;
            self.next_index += 1;
            self.in_flight += 1;
            Some(index)
        } else {
            None
        }
    }

    /// 填满空位，返回本次要启动的全部下标
    pub fn fill(&mut self) -> Vec<usize> {
        std::iter::from_fn(|| self.next_to_start()).collect()
    }

    /// 一个进行中的文件到达终止状态。
    /// 仅在本次调用使队列排空时返回 true，每批最多一次
    pub fn finish(&mut self) -> bool {
        if self.in_flight == 0 {
            tracing::warn!("收到多余的完成信号，已忽略");
            return false;
        }
        self.in_flight -= 1;
        self.completed += 1;
        self.check_drained()
    }

    /// 取消：所有未开始的文件直接计为完成，返回它们的下标和是否因此排空
    pub fn cancel_pending(&mut self) -> (Vec<usize>, bool) {
        let pending: Vec<usize> = (self.next_index..self.total).collect();
        self.next_index = self.total;
        self.completed += pending.len();
        let drained_now = !pending.is_empty() && self.check_drained();
        (pending, drained_now)
    }

    fn check_drained(&mut self) -> bool {
        if self.completed == self.total && !self.drained {
            self.drained = true;
            true
        } else {
            false
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }
}
