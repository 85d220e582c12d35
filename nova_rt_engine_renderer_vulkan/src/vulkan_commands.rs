/// VulkanCommandExecutor - Vulkan implementation of the CommandExecutor trait
///
/// Owns a TRANSIENT command pool on the graphics queue family and records
/// one-shot command buffers out of it. Submitted buffers are parked until
/// the next `wait_idle`, which drains the queue and returns them to the
/// pool. Streams are the raw command-buffer handles.

use std::sync::Mutex;

use nova_rt_engine::novart::Result;
use nova_rt_engine::novart::device::{CommandExecutor, CommandStream};
use nova_rt_engine::engine_err;
use ash::vk;
use ash::vk::Handle;

/// Vulkan one-shot command executor implementation
pub struct VulkanCommandExecutor {
    /// Vulkan logical device
    device: ash::Device,
    /// Queue one-shot work is submitted to
    queue: vk::Queue,
    /// Transient pool the one-shot buffers are allocated from
    command_pool: vk::CommandPool,
    /// Submitted buffers awaiting the next wait_idle
    pending: Mutex<Vec<vk::CommandBuffer>>,
}

impl VulkanCommandExecutor {
    /// Create the executor and its transient command pool
    ///
    /// # Arguments
    ///
    /// * `device` - Vulkan logical device
    /// * `queue` - Queue to submit one-shot work to
    /// * `queue_family_index` - Family index of `queue`
    ///
    /// # Errors
    ///
    /// `Error::BackendError` if the command pool cannot be created.
    pub fn new(device: ash::Device, queue: vk::Queue, queue_family_index: u32) -> Result<Self> {
        let pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);

        let command_pool = unsafe {
            device
                .create_command_pool(&pool_create_info, None)
                .map_err(|e| engine_err!("novart::vulkan",
                    "Failed to create one-shot command pool: {:?}", e))?
        };

        Ok(Self {
            device,
            queue,
            command_pool,
            pending: Mutex::new(Vec::new()),
        })
    }
}

impl CommandExecutor for VulkanCommandExecutor {
    fn begin_one_shot(&self) -> Result<CommandStream> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        unsafe {
            let command_buffer = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!("novart::vulkan",
                    "Failed to allocate one-shot command buffer: {:?}", e))?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("novart::vulkan",
                    "Failed to begin one-shot command buffer: {:?}", e))?;

            Ok(CommandStream(command_buffer.as_raw()))
        }
    }

    fn submit(&self, stream: CommandStream) -> Result<()> {
        let command_buffer = vk::CommandBuffer::from_raw(stream.0);

        unsafe {
            self.device
                .end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("novart::vulkan",
                    "Failed to end one-shot command buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            self.device
                .queue_submit(self.queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("novart::vulkan",
                    "Failed to submit one-shot commands: {:?}", e))?;
        }

        self.pending.lock().unwrap().push(command_buffer);
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .queue_wait_idle(self.queue)
                .map_err(|e| engine_err!("novart::vulkan",
                    "Failed to wait for queue idle: {:?}", e))?;
        }

        // The queue drained, so the parked buffers can go back to the pool
        let drained: Vec<vk::CommandBuffer> = self.pending.lock().unwrap().drain(..).collect();
        if !drained.is_empty() {
            unsafe {
                self.device.free_command_buffers(self.command_pool, &drained);
            }
        }
        Ok(())
    }
}

impl Drop for VulkanCommandExecutor {
    fn drop(&mut self) {
        unsafe {
            // Frees any still-parked buffers with the pool
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
